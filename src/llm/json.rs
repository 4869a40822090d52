//! JSON extraction from free-form LLM output.
//!
//! Generation endpoints asked for JSON still wrap it in markdown fences or
//! surrounding prose often enough that a tolerant extraction step is needed
//! before deserialization. Extraction failure is a parse error, handled by
//! the caller as a per-unit failure.

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Extracts a JSON object from LLM output, handling markdown code blocks.
pub fn extract_json(content: &str) -> Result<String, LlmError> {
    let trimmed = content.trim();

    // Already bare JSON.
    if trimmed.starts_with('{') {
        if let Some(end) = find_matching_brace(trimmed) {
            return Ok(trimmed[..=end].to_string());
        }
        return Ok(trimmed.to_string());
    }

    // ```json fenced block.
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return Ok(trimmed[json_start..json_start + end].trim().to_string());
        }
    }

    // Generic fenced block.
    if let Some(start) = trimmed.find("```") {
        let content_start = start + 3;
        let line_end = trimmed[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = trimmed[line_end..].find("```") {
            return Ok(trimmed[line_end..line_end + end].trim().to_string());
        }
    }

    // JSON object embedded in prose.
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = find_matching_brace(&trimmed[start..]) {
            return Ok(trimmed[start..=start + end].to_string());
        }
    }

    Err(LlmError::ParseError(
        "Could not extract JSON from response".to_string(),
    ))
}

/// Extracts and deserializes a JSON object in one step.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let json = extract_json(content)?;
    serde_json::from_str(&json).map_err(|e| LlmError::ParseError(format!("Invalid JSON: {}", e)))
}

/// Finds the index of the brace matching the first `{`, string-aware.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
