//! Batch lifecycle coordination.
//!
//! The coordinator owns admission control (at most one running batch),
//! fire-and-forget launching of the execution engine, cancellation, bulk
//! deletion, and crash recovery at startup. The store is the single source of
//! truth for all of it; the coordinator keeps only a read-through status
//! cache so pollers get an answer even when a status read hits a transient
//! store error.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::CoordinatorError;
use crate::model::{BatchStatus, BatchStatusView, ExplorationBatch};
use crate::store::ExplorationStore;

use super::engine::ExplorationEngine;

/// Returned by a successful batch start.
#[derive(Debug, Clone)]
pub struct StartedBatch {
    pub batch_id: Uuid,
    pub total_patterns: i64,
}

/// Coordinates batch lifecycle operations over the store and engine.
pub struct BatchCoordinator {
    store: Arc<dyn ExplorationStore>,
    engine: Arc<ExplorationEngine>,
    catalog: Arc<Catalog>,
    status_cache: RwLock<Option<BatchStatusView>>,
}

impl BatchCoordinator {
    /// Creates a new coordinator.
    pub fn new(
        store: Arc<dyn ExplorationStore>,
        engine: Arc<ExplorationEngine>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            store,
            engine,
            catalog,
            status_cache: RwLock::new(None),
        }
    }

    /// Starts a new exploration batch and returns immediately.
    ///
    /// Rejected with [`CoordinatorError::Conflict`] while any batch is
    /// running, and with [`CoordinatorError::FatalSetup`] when the pattern
    /// universe is empty. The engine run is spawned detached; callers observe
    /// progress by polling [`Self::get_status`].
    pub async fn start_batch(&self) -> Result<StartedBatch, CoordinatorError> {
        if !self.store.running_batches().await?.is_empty() {
            return Err(CoordinatorError::Conflict);
        }

        let total = self.catalog.universe_size() as i64;
        if total == 0 {
            return Err(CoordinatorError::FatalSetup(
                "pattern universe is empty (no segments or no themes)".to_string(),
            ));
        }

        let batch = ExplorationBatch::new(total);
        self.store.insert_batch(&batch).await?;

        info!(batch_id = %batch.id, total_patterns = total, "Exploration batch started");
        self.spawn_run(batch.id);

        Ok(StartedBatch {
            batch_id: batch.id,
            total_patterns: total,
        })
    }

    /// Returns a progress view of the batch.
    ///
    /// Reads through to the store and refreshes the cache. A missing batch
    /// row degrades to the `idle` view. On a store read failure the last
    /// cached view is served instead, falling back to `idle` when there is
    /// none.
    pub async fn get_status(&self, batch_id: Uuid) -> BatchStatusView {
        match self.store.get_batch(batch_id).await {
            Ok(Some(batch)) => {
                let view = BatchStatusView::from_batch(&batch);
                *self.status_cache.write().await = Some(view.clone());
                view
            }
            Ok(None) => BatchStatusView::idle(),
            Err(e) => {
                warn!(batch_id = %batch_id, error = %e, "Status read failed, serving cached view");
                self.status_cache
                    .read()
                    .await
                    .clone()
                    .unwrap_or_else(BatchStatusView::idle)
            }
        }
    }

    /// Requests cancellation of a running batch.
    ///
    /// The status flips to `cancelled` immediately; the engine observes it at
    /// the next chunk boundary, so in-flight work for the current chunk still
    /// lands.
    pub async fn cancel_batch(&self, batch_id: Uuid) -> Result<(), CoordinatorError> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or(CoordinatorError::BatchNotFound(batch_id))?;

        if batch.status != BatchStatus::Running {
            return Err(CoordinatorError::InvalidState {
                status: batch.status.to_string(),
            });
        }

        self.store
            .set_batch_status(batch_id, BatchStatus::Cancelled, Some(chrono::Utc::now()))
            .await?;

        info!(batch_id = %batch_id, "Batch cancellation requested");
        Ok(())
    }

    /// Deletes all batches, result items and reports.
    ///
    /// Refused while any batch is running. Returns the number of batches
    /// deleted.
    pub async fn delete_all(&self) -> Result<u64, CoordinatorError> {
        if !self.store.running_batches().await?.is_empty() {
            return Err(CoordinatorError::Conflict);
        }

        let deleted = self.store.delete_all_batches().await?;
        *self.status_cache.write().await = None;

        info!(deleted = deleted, "Deleted all exploration batches");
        Ok(deleted)
    }

    /// Resumes every batch left in `running` state by a previous process.
    ///
    /// Called once at startup. Each resumed batch re-derives its pending
    /// patterns from result-item existence, so no completed work is repeated.
    /// Returns the ids of the batches resumed.
    pub async fn resume_running_batches(&self) -> Result<Vec<Uuid>, CoordinatorError> {
        let running = self.store.running_batches().await?;
        let mut resumed = Vec::with_capacity(running.len());

        for batch in running {
            info!(
                batch_id = %batch.id,
                completed = batch.completed_patterns,
                total = batch.total_patterns,
                "Resuming interrupted batch"
            );
            self.spawn_run(batch.id);
            resumed.push(batch.id);
        }

        Ok(resumed)
    }

    /// Spawns a detached engine run for the batch.
    fn spawn_run(&self, batch_id: Uuid) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.run(batch_id).await {
                error!(batch_id = %batch_id, error = %e, "Engine run aborted");
            }
        });
    }
}
