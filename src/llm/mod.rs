//! Generation service client.
//!
//! The generation service is an external collaborator: an OpenAI-compatible
//! chat completion endpoint with no determinism guarantee. Everything the
//! pipeline needs from it goes through the [`LlmProvider`] trait so tests can
//! substitute a scripted provider.
//!
//! Responses that are supposed to carry structured JSON go through
//! [`json::extract_json`], which tolerates markdown fences and surrounding
//! prose; a response that still fails to parse is a first-class error, never
//! an unchecked cast.

mod client;
pub mod json;

pub use client::{
    GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message, Usage,
};
