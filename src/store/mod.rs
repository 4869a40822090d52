//! Persistent store for batches, result items and scope reports.
//!
//! The store is the sole source of truth for all coordination state: batch
//! status, progress counters, and the completed-pattern set are recomputed
//! from here across process restarts. Two implementations are provided:
//!
//! - [`PgStore`] - PostgreSQL via sqlx, the production backend
//! - [`MemoryStore`] - in-process maps, used by tests and dry runs

mod database;
mod memory;
mod migrations;
mod schema;

pub use database::PgStore;
pub use memory::MemoryStore;
pub use migrations::MigrationRunner;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    BatchStatus, ExplorationBatch, PatternError, PatternKey, ReportSection, ReportStatus,
    ResultItem, ScopeReport,
};

/// Progress counters persisted after every chunk.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub batch_id: Uuid,
    pub completed_patterns: i64,
    pub total_result_items: i64,
    pub current_chunk_label: String,
    /// Full error list; replaces the stored list.
    pub errors: Vec<PatternError>,
}

/// Storage operations the pipeline depends on.
///
/// Implementations must make `delete_all_batches` cascade to result items and
/// reports, and must support the completed-pattern-key existence query that
/// crash resumption is built on.
#[async_trait]
pub trait ExplorationStore: Send + Sync {
    // -------------------------------------------------------------------
    // Batches
    // -------------------------------------------------------------------

    /// Inserts a new batch row.
    async fn insert_batch(&self, batch: &ExplorationBatch) -> Result<(), StoreError>;

    /// Fetches a batch by id. `None` if it does not exist.
    async fn get_batch(&self, id: Uuid) -> Result<Option<ExplorationBatch>, StoreError>;

    /// All batches currently in `running` state, oldest first.
    async fn running_batches(&self) -> Result<Vec<ExplorationBatch>, StoreError>;

    /// Persists chunk-boundary progress counters.
    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), StoreError>;

    /// Moves a batch to a new status, stamping `completed_at` when given.
    async fn set_batch_status(
        &self,
        id: Uuid,
        status: BatchStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Deletes all batches, cascading to result items and reports.
    /// Returns the number of batches removed.
    async fn delete_all_batches(&self) -> Result<u64, StoreError>;

    // -------------------------------------------------------------------
    // Result items
    // -------------------------------------------------------------------

    /// Inserts one immutable result item.
    async fn insert_result_item(&self, item: &ResultItem) -> Result<(), StoreError>;

    /// Pattern keys that already have at least one result item for the batch.
    /// This is what resumption treats as "done".
    async fn existing_pattern_keys(&self, batch_id: Uuid)
        -> Result<HashSet<PatternKey>, StoreError>;

    /// Number of result items persisted for the batch.
    async fn count_result_items(&self, batch_id: Uuid) -> Result<i64, StoreError>;

    /// Result items for the batch, optionally filtered to one segment,
    /// ordered by composite score descending, truncated to `limit`.
    async fn top_result_items(
        &self,
        batch_id: Uuid,
        segment_filter: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ResultItem>, StoreError>;

    // -------------------------------------------------------------------
    // Scope reports
    // -------------------------------------------------------------------

    /// Inserts a report row (normally a `generating` placeholder).
    async fn insert_report(&self, report: &ScopeReport) -> Result<(), StoreError>;

    /// Moves a report to a terminal state with its synthesis output.
    async fn finalize_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        sections: &[ReportSection],
        error: Option<&str>,
    ) -> Result<(), StoreError>;

    /// All reports for a batch, in creation order.
    async fn reports_for_batch(&self, batch_id: Uuid) -> Result<Vec<ScopeReport>, StoreError>;

    /// Deletes all reports for a batch. Returns the number removed.
    async fn delete_reports_for_batch(&self, batch_id: Uuid) -> Result<u64, StoreError>;
}
