//! Integration tests for the LLM client.
//!
//! These tests make real API calls to an OpenAI-compatible endpoint.
//! Run with: IDEAFORGE_API_BASE=... IDEAFORGE_API_KEY=... cargo test --test llm_integration -- --ignored

use ideaforge::llm::{GenerationRequest, LiteLlmClient, LlmProvider, Message};

fn create_test_client() -> LiteLlmClient {
    LiteLlmClient::from_env()
        .expect("IDEAFORGE_API_BASE environment variable must be set for integration tests")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test llm_integration -- --ignored
async fn test_simple_generation() {
    let client = create_test_client();

    let request = GenerationRequest::new(
        "",
        vec![
            Message::system("You are a helpful assistant. Reply concisely."),
            Message::user("What is 2 + 2? Reply with just the number."),
        ],
    )
    .with_max_tokens(10)
    .with_temperature(0.0);

    let response = client.generate(request).await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let response = response.expect("Should have response");
    assert!(
        response.content.contains('4'),
        "Response should contain '4', got: {}",
        response.content
    );
}

#[tokio::test]
#[ignore]
async fn test_json_output_is_parseable() {
    let client = create_test_client();

    let request = GenerationRequest::new(
        "",
        vec![
            Message::system(
                "Respond with a single JSON object of the shape {\"answer\": <number>}.",
            ),
            Message::user("What is 2 + 2?"),
        ],
    )
    .with_temperature(0.0)
    .with_json_output();

    let response = client
        .generate(request)
        .await
        .expect("Should have response");

    let extracted = ideaforge::llm::json::extract_json(&response.content)
        .expect("Response should contain JSON");
    let value: serde_json::Value =
        serde_json::from_str(&extracted).expect("Extracted JSON should parse");
    assert_eq!(value["answer"], 4);
}
