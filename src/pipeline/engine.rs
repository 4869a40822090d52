//! Resumable, chunked execution of exploration batches.
//!
//! The engine drives one batch through the full pattern universe in
//! fixed-size chunks. Completed patterns are recomputed from result-item
//! existence on every run, so a killed process resumes where it left off
//! without a write-ahead log. A pattern whose execution legitimately produced
//! zero result items is indistinguishable from one never attempted and will
//! be retried on resume; this is a known resumption ambiguity.
//!
//! Cancellation is cooperative: the batch status is re-read before every
//! chunk and an in-flight chunk always runs to completion. No per-call
//! timeout is enforced here; a hung generation call stalls its chunk for as
//! long as the HTTP client allows.

use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::corpus::{CorpusProvider, Document};
use crate::error::{EngineError, LlmError};
use crate::llm::{json, GenerationRequest, LlmProvider, Message};
use crate::model::{
    BatchStatus, ConceptPayload, ExplorationBatch, PatternError, PatternKey, ResultItem,
};
use crate::prompts;
use crate::scoring::{self, RawScores};
use crate::store::{ExplorationStore, ProgressUpdate};

use super::config::PipelineConfig;

/// Shape of one generated concept as returned by the LLM.
#[derive(Debug, Deserialize)]
struct RawConcept {
    name: String,
    description: String,
    rationale: String,
    #[serde(default)]
    next_steps: Vec<String>,
    scores: RawScores,
}

/// Drives chunked, bounded-concurrency execution of pending patterns.
pub struct ExplorationEngine {
    store: Arc<dyn ExplorationStore>,
    llm: Arc<dyn LlmProvider>,
    corpus: Arc<dyn CorpusProvider>,
    catalog: Arc<Catalog>,
    config: PipelineConfig,
}

impl ExplorationEngine {
    /// Creates a new engine over the given collaborators.
    pub fn new(
        store: Arc<dyn ExplorationStore>,
        llm: Arc<dyn LlmProvider>,
        corpus: Arc<dyn CorpusProvider>,
        catalog: Arc<Catalog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            llm,
            corpus,
            catalog,
            config,
        }
    }

    /// Runs (or resumes) the batch to completion, cancellation, or failure.
    ///
    /// Idempotent as long as the coordinator's running-state guard prevents
    /// two concurrent runs of the same batch. Safe to call on a batch that
    /// no longer exists: it returns silently.
    pub async fn run(&self, batch_id: Uuid) -> Result<(), EngineError> {
        let Some(batch) = self.store.get_batch(batch_id).await? else {
            debug!(batch_id = %batch_id, "Batch no longer exists, nothing to run");
            return Ok(());
        };

        if batch.status != BatchStatus::Running {
            debug!(batch_id = %batch_id, status = %batch.status, "Batch not running, nothing to do");
            return Ok(());
        }

        // Corpus and universe checks are fatal setup conditions: the batch
        // fails immediately without attempting any pattern.
        let documents = match self.corpus.load_documents().await {
            Ok(docs) if docs.is_empty() => {
                return self
                    .fail_batch(&batch, "document corpus is empty, no source material")
                    .await;
            }
            Ok(docs) => docs,
            Err(e) => {
                return self
                    .fail_batch(&batch, &format!("failed to load corpus: {}", e))
                    .await;
            }
        };

        let universe = self.catalog.enumerate_patterns();
        if universe.is_empty() {
            return self.fail_batch(&batch, "pattern universe is empty").await;
        }

        // "Done" is inferred purely from result-item existence.
        let done = self.store.existing_pattern_keys(batch_id).await?;
        let pending: Vec<PatternKey> = universe
            .into_iter()
            .filter(|key| !done.contains(key))
            .collect();

        info!(
            batch_id = %batch_id,
            total = batch.total_patterns,
            already_done = done.len(),
            pending = pending.len(),
            "Starting exploration run"
        );

        // The persisted counter can lag the done-set when the previous
        // process died between inserting items and updating progress.
        let mut completed = batch
            .completed_patterns
            .max(batch.total_patterns - pending.len() as i64);
        let mut total_items = self.store.count_result_items(batch_id).await?;
        let mut errors = batch.errors.clone();

        let chunk_count = pending.len().div_ceil(self.config.chunk_size);

        for (chunk_idx, chunk) in pending.chunks(self.config.chunk_size).enumerate() {
            // Cooperative cancellation: checked only at chunk boundaries.
            match self.store.get_batch(batch_id).await? {
                None => {
                    debug!(batch_id = %batch_id, "Batch deleted mid-run, stopping");
                    return Ok(());
                }
                Some(current) if current.status != BatchStatus::Running => {
                    info!(
                        batch_id = %batch_id,
                        status = %current.status,
                        "Batch no longer running, stopping before next chunk"
                    );
                    return Ok(());
                }
                Some(_) => {}
            }

            let label = format!("chunk {} of {} ({} patterns)", chunk_idx + 1, chunk_count, chunk.len());
            debug!(batch_id = %batch_id, label = %label, "Dispatching chunk");

            // Settle-all join: one pattern's failure never aborts siblings.
            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|key| self.execute_pattern(key, &documents)),
            )
            .await;

            for (key, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(item) => {
                        let item = ResultItem {
                            id: Uuid::new_v4(),
                            batch_id,
                            segment_id: key.segment_id.clone(),
                            theme_id: key.theme_id.clone(),
                            payload: item.payload,
                            scores: item.scores,
                            composite_score: item.composite_score,
                            created_at: chrono::Utc::now(),
                        };
                        self.store.insert_result_item(&item).await?;
                        total_items += 1;
                    }
                    Err(e) => {
                        warn!(batch_id = %batch_id, pattern = %key.label(), error = %e, "Pattern execution failed");
                        errors.push(PatternError::new(key.label(), e.to_string()));
                    }
                }
            }

            // Chunks are strictly sequential, so the counter advances by
            // exactly the chunk size, clamped to the universe size.
            completed = (completed + chunk.len() as i64).min(batch.total_patterns);

            self.store
                .update_progress(&ProgressUpdate {
                    batch_id,
                    completed_patterns: completed,
                    total_result_items: total_items,
                    current_chunk_label: label,
                    errors: errors.clone(),
                })
                .await?;
        }

        self.store
            .set_batch_status(batch_id, BatchStatus::Completed, Some(chrono::Utc::now()))
            .await?;

        info!(
            batch_id = %batch_id,
            completed = completed,
            items = total_items,
            errors = errors.len(),
            "Exploration batch completed"
        );

        Ok(())
    }

    /// Marks the batch failed for a fatal setup condition.
    async fn fail_batch(&self, batch: &ExplorationBatch, reason: &str) -> Result<(), EngineError> {
        warn!(batch_id = %batch.id, reason = reason, "Fatal setup error, failing batch");

        let mut errors = batch.errors.clone();
        errors.push(PatternError::new("setup", reason));

        self.store
            .update_progress(&ProgressUpdate {
                batch_id: batch.id,
                completed_patterns: batch.completed_patterns,
                total_result_items: batch.total_result_items,
                current_chunk_label: batch.current_chunk_label.clone(),
                errors,
            })
            .await?;
        self.store
            .set_batch_status(batch.id, BatchStatus::Failed, Some(chrono::Utc::now()))
            .await?;
        Ok(())
    }

    /// Executes one pattern: generation call, parse, scoring.
    ///
    /// Returns the scored concept without persisting it; persistence is the
    /// caller's job so that store failures stay separate from pattern
    /// failures.
    async fn execute_pattern(
        &self,
        key: &PatternKey,
        documents: &[Document],
    ) -> Result<ScoredConcept, LlmError> {
        let segment = self
            .catalog
            .segment(&key.segment_id)
            .ok_or_else(|| LlmError::ParseError(format!("unknown segment '{}'", key.segment_id)))?;
        let theme = self
            .catalog
            .theme(&key.theme_id)
            .ok_or_else(|| LlmError::ParseError(format!("unknown theme '{}'", key.theme_id)))?;

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(prompts::EXPLORATION_SYSTEM_PROMPT),
                Message::user(prompts::build_exploration_prompt(segment, theme, documents)),
            ],
        )
        .with_temperature(self.config.exploration_temperature)
        .with_json_output();

        let response = self.llm.generate(request).await?;
        let raw: RawConcept = json::parse_structured(&response.content)?;

        let (scores, composite_score) = scoring::score(&raw.scores, None);

        Ok(ScoredConcept {
            payload: ConceptPayload {
                name: raw.name,
                description: raw.description,
                rationale: raw.rationale,
                next_steps: raw.next_steps,
            },
            scores,
            composite_score,
        })
    }
}

/// A parsed, scored concept ready for persistence.
struct ScoredConcept {
    payload: ConceptPayload,
    scores: crate::model::SubScores,
    composite_score: f64,
}
