//! Per-scope report synthesis over a finished batch's result items.
//!
//! Each scope (one per audience segment, plus a whole-batch overview) gets its
//! own report row. A placeholder row in `generating` state is created before
//! any LLM call, then finalized to `completed` or `failed`. Scopes are
//! synthesized concurrently up to a configured limit, and one scope's failure
//! never blocks the others.
//!
//! Truncated or malformed responses are retried with escalating max-output
//! budgets; when every tier fails the report is finalized `failed` with the
//! last error, never left in `generating`.

use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Scope, OVERVIEW_SCOPE_ID};
use crate::error::{LlmError, SynthesisError};
use crate::llm::{json, GenerationRequest, LlmProvider, Message};
use crate::model::{ReportSection, ReportStatus, ScopeReport};
use crate::prompts;
use crate::store::ExplorationStore;

use super::config::PipelineConfig;

/// Shape of a synthesized report as returned by the LLM.
#[derive(Debug, Deserialize)]
struct RawReport {
    sections: Vec<ReportSection>,
}

/// Synthesizes scope reports from a batch's persisted result items.
pub struct SynthesisEngine {
    store: Arc<dyn ExplorationStore>,
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl SynthesisEngine {
    /// Creates a new synthesis engine.
    pub fn new(
        store: Arc<dyn ExplorationStore>,
        llm: Arc<dyn LlmProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self { store, llm, config }
    }

    /// Deletes any existing reports for the batch and synthesizes every scope
    /// from scratch.
    pub async fn regenerate(&self, batch_id: Uuid, scopes: &[Scope]) -> Result<(), SynthesisError> {
        let deleted = self.store.delete_reports_for_batch(batch_id).await?;
        info!(batch_id = %batch_id, deleted = deleted, scopes = scopes.len(), "Regenerating all scope reports");
        self.synthesize_scopes(batch_id, scopes).await
    }

    /// Synthesizes reports only for scopes that have no report row yet.
    ///
    /// Idempotent: scopes with an existing row are skipped regardless of that
    /// row's status, so repeated calls do no duplicate work.
    pub async fn auto_fill_missing(
        &self,
        batch_id: Uuid,
        scopes: &[Scope],
    ) -> Result<(), SynthesisError> {
        let existing: HashSet<String> = self
            .store
            .reports_for_batch(batch_id)
            .await?
            .into_iter()
            .map(|r| r.scope_id)
            .collect();

        let missing: Vec<Scope> = scopes
            .iter()
            .filter(|s| !existing.contains(&s.id))
            .cloned()
            .collect();

        if missing.is_empty() {
            debug!(batch_id = %batch_id, "All scope reports present, nothing to fill");
            return Ok(());
        }

        info!(batch_id = %batch_id, missing = missing.len(), "Filling in missing scope reports");
        self.synthesize_scopes(batch_id, &missing).await
    }

    /// Returns all reports for the batch, auto-filling missing scopes first.
    pub async fn reports(
        &self,
        batch_id: Uuid,
        scopes: &[Scope],
    ) -> Result<Vec<ScopeReport>, SynthesisError> {
        self.auto_fill_missing(batch_id, scopes).await?;
        Ok(self.store.reports_for_batch(batch_id).await?)
    }

    /// Synthesizes the given scopes with bounded concurrency.
    ///
    /// A placeholder row is inserted for every scope up front, so a crash
    /// mid-synthesis leaves visible `generating` rows rather than silently
    /// missing scopes.
    async fn synthesize_scopes(
        &self,
        batch_id: Uuid,
        scopes: &[Scope],
    ) -> Result<(), SynthesisError> {
        let mut reports = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let report = ScopeReport::placeholder(batch_id, &scope.id, &scope.name);
            self.store.insert_report(&report).await?;
            reports.push((report.id, scope.clone()));
        }

        for chunk in reports.chunks(self.config.synthesis_concurrency) {
            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|(report_id, scope)| self.synthesize_scope(batch_id, *report_id, scope)),
            )
            .await;

            for outcome in outcomes {
                outcome?;
            }
        }

        Ok(())
    }

    /// Runs synthesis for one scope, finalizing its placeholder row.
    async fn synthesize_scope(
        &self,
        batch_id: Uuid,
        report_id: Uuid,
        scope: &Scope,
    ) -> Result<(), SynthesisError> {
        let limit = if scope.id == OVERVIEW_SCOPE_ID {
            self.config.overview_top_n
        } else {
            self.config.scope_top_n
        };

        let items = self
            .store
            .top_result_items(batch_id, scope.segment_filter.as_deref(), limit)
            .await?;

        if items.is_empty() {
            debug!(batch_id = %batch_id, scope = %scope.id, "No result items in scope");
            let sections = [ReportSection::new(
                "No results",
                format!("No result items were produced for the '{}' scope.", scope.name),
            )];
            self.store
                .finalize_report(report_id, ReportStatus::Completed, &sections, None)
                .await?;
            return Ok(());
        }

        let prompt = prompts::build_synthesis_prompt(&scope.name, &items);
        let mut last_error = String::new();

        for &budget in &self.config.budget_tiers {
            match self.generate_report(&prompt, budget).await {
                Ok(sections) => {
                    info!(
                        batch_id = %batch_id,
                        scope = %scope.id,
                        items = items.len(),
                        sections = sections.len(),
                        "Scope report synthesized"
                    );
                    self.store
                        .finalize_report(report_id, ReportStatus::Completed, &sections, None)
                        .await?;
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        batch_id = %batch_id,
                        scope = %scope.id,
                        budget = budget,
                        error = %e,
                        "Synthesis attempt failed, escalating budget"
                    );
                    last_error = e.to_string();
                }
            }
        }

        self.store
            .finalize_report(report_id, ReportStatus::Failed, &[], Some(&last_error))
            .await?;
        Ok(())
    }

    /// One synthesis generation call at the given output budget.
    async fn generate_report(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Vec<ReportSection>, LlmError> {
        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(prompts::SYNTHESIS_SYSTEM_PROMPT),
                Message::user(prompt),
            ],
        )
        .with_temperature(self.config.synthesis_temperature)
        .with_max_tokens(max_tokens)
        .with_json_output();

        let response = self.llm.generate(request).await?;
        let raw: RawReport = json::parse_structured(&response.content)?;

        if raw.sections.is_empty() {
            return Err(LlmError::ParseError(
                "report contains no sections".to_string(),
            ));
        }

        Ok(raw.sections)
    }
}
