//! Prompt construction for exploration and synthesis calls.
//!
//! Pure string building, no I/O. Exploration prompts embed corpus excerpts
//! plus one (segment, theme) pair; synthesis prompts embed the top-scored
//! result items of one scope. Both stages ask for structured JSON and rely
//! on [`crate::llm::json`] to recover it from the response.

use crate::catalog::{Segment, Theme};
use crate::corpus::Document;
use crate::model::ResultItem;

/// Maximum characters of any single document embedded into a prompt.
const MAX_DOC_EXCERPT_CHARS: usize = 4_000;

/// System prompt for concept exploration calls.
pub const EXPLORATION_SYSTEM_PROMPT: &str = "\
You are a product strategist generating concrete product concepts from source \
material. Ground every concept in the provided documents; do not invent facts \
about the audience. Respond with a single JSON object and nothing else, using \
exactly this shape:
{
  \"name\": \"short concept name\",
  \"description\": \"2-4 sentence description\",
  \"rationale\": \"why this fits the audience and theme, citing the documents\",
  \"next_steps\": [\"first concrete step\", \"second concrete step\"],
  \"scores\": {
    \"relevance\": 1-5,
    \"feasibility\": 1-5,
    \"impact\": 1-5,
    \"novelty\": 1-5
  }
}";

/// System prompt for report synthesis calls.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "\
You are an analyst synthesizing a set of scored product concepts into a \
report. Identify the strongest concepts, the recurring themes, and the gaps. \
Be specific; reference concepts by name. Respond with a single JSON object \
and nothing else, using exactly this shape:
{
  \"sections\": [
    { \"heading\": \"section heading\", \"body\": \"section text\" }
  ]
}";

/// Builds the user prompt for one exploration pattern.
pub fn build_exploration_prompt(
    segment: &Segment,
    theme: &Theme,
    documents: &[Document],
) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Source documents\n\n");
    for doc in documents {
        prompt.push_str(&format!("### {}\n", doc.title));
        prompt.push_str(excerpt(&doc.body));
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "## Task\n\nGenerate one product concept for this audience and angle.\n\n\
         Audience segment: {} ({})\n\
         Opportunity theme: {} ({})\n",
        segment.name, segment.profile, theme.name, theme.angle,
    ));

    prompt
}

/// Builds the user prompt for synthesizing one scope's report.
pub fn build_synthesis_prompt(scope_name: &str, items: &[ResultItem]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "## Scope: {}\n\n{} concepts, highest composite score first.\n\n",
        scope_name,
        items.len()
    ));

    for (i, item) in items.iter().enumerate() {
        prompt.push_str(&format!(
            "### {}. {} (composite {:.2})\n\
             Segment: {} | Theme: {}\n\
             Scores: relevance {}, feasibility {}, impact {}, novelty {}\n\
             {}\n\
             Rationale: {}\n\n",
            i + 1,
            item.payload.name,
            item.composite_score,
            item.segment_id,
            item.theme_id,
            item.scores.relevance,
            item.scores.feasibility,
            item.scores.impact,
            item.scores.novelty,
            item.payload.description,
            item.payload.rationale,
        ));
    }

    prompt.push_str(
        "## Task\n\nSynthesize these concepts into a report with sections for: \
         top recommendations, recurring themes, notable outliers, and suggested \
         next steps for this scope.\n",
    );

    prompt
}

/// Truncates a document body to the per-document excerpt budget on a char
/// boundary.
fn excerpt(body: &str) -> &str {
    if body.len() <= MAX_DOC_EXCERPT_CHARS {
        return body;
    }
    let mut end = MAX_DOC_EXCERPT_CHARS;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConceptPayload, SubScores};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_segment() -> Segment {
        Segment {
            id: "smb".to_string(),
            name: "Small businesses".to_string(),
            profile: "Owner-operators".to_string(),
        }
    }

    fn sample_theme() -> Theme {
        Theme {
            id: "automation".to_string(),
            name: "Automation".to_string(),
            angle: "Removing manual steps".to_string(),
        }
    }

    fn sample_item() -> ResultItem {
        ResultItem {
            id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            segment_id: "smb".to_string(),
            theme_id: "automation".to_string(),
            payload: ConceptPayload {
                name: "Invoice chaser".to_string(),
                description: "Chases invoices.".to_string(),
                rationale: "Cash flow pain.".to_string(),
                next_steps: vec!["Prototype".to_string()],
            },
            scores: SubScores {
                relevance: 5,
                feasibility: 4,
                impact: 4,
                novelty: 3,
            },
            composite_score: 4.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_exploration_prompt_embeds_pattern_and_docs() {
        let docs = vec![Document {
            title: "notes".to_string(),
            body: "pain points".to_string(),
        }];
        let prompt = build_exploration_prompt(&sample_segment(), &sample_theme(), &docs);
        assert!(prompt.contains("Small businesses"));
        assert!(prompt.contains("Automation"));
        assert!(prompt.contains("### notes"));
        assert!(prompt.contains("pain points"));
    }

    #[test]
    fn test_exploration_prompt_truncates_long_documents() {
        let docs = vec![Document {
            title: "huge".to_string(),
            body: "x".repeat(MAX_DOC_EXCERPT_CHARS * 2),
        }];
        let prompt = build_exploration_prompt(&sample_segment(), &sample_theme(), &docs);
        assert!(prompt.len() < MAX_DOC_EXCERPT_CHARS * 2);
    }

    #[test]
    fn test_synthesis_prompt_lists_items_with_scores() {
        let prompt = build_synthesis_prompt("Overview", &[sample_item()]);
        assert!(prompt.contains("Invoice chaser"));
        assert!(prompt.contains("composite 4.00"));
        assert!(prompt.contains("1 concepts"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let body = "é".repeat(MAX_DOC_EXCERPT_CHARS);
        // Must not panic on a multi-byte boundary.
        let cut = excerpt(&body);
        assert!(cut.len() <= MAX_DOC_EXCERPT_CHARS);
    }
}
