//! In-memory store implementation.
//!
//! Mirrors the observable semantics of [`super::PgStore`] over
//! `tokio::sync::RwLock` maps. Used by the integration test suite and by
//! dry runs where no database is available.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    BatchStatus, ExplorationBatch, PatternKey, ReportSection, ReportStatus, ResultItem,
    ScopeReport,
};

use super::{ExplorationStore, ProgressUpdate};

/// In-process store over locked maps.
#[derive(Default)]
pub struct MemoryStore {
    batches: RwLock<HashMap<Uuid, ExplorationBatch>>,
    items: RwLock<Vec<ResultItem>>,
    reports: RwLock<Vec<ScopeReport>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of result items across all batches (test convenience).
    pub async fn result_item_count(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl ExplorationStore for MemoryStore {
    async fn insert_batch(&self, batch: &ExplorationBatch) -> Result<(), StoreError> {
        self.batches.write().await.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> Result<Option<ExplorationBatch>, StoreError> {
        Ok(self.batches.read().await.get(&id).cloned())
    }

    async fn running_batches(&self) -> Result<Vec<ExplorationBatch>, StoreError> {
        let mut running: Vec<ExplorationBatch> = self
            .batches
            .read()
            .await
            .values()
            .filter(|b| b.status == BatchStatus::Running)
            .cloned()
            .collect();
        running.sort_by_key(|b| b.started_at);
        Ok(running)
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), StoreError> {
        let mut batches = self.batches.write().await;
        let batch = batches
            .get_mut(&update.batch_id)
            .ok_or_else(|| StoreError::NotFound(format!("Batch {}", update.batch_id)))?;

        batch.completed_patterns = update.completed_patterns;
        batch.total_result_items = update.total_result_items;
        batch.current_chunk_label = update.current_chunk_label.clone();
        batch.errors = update.errors.clone();
        Ok(())
    }

    async fn set_batch_status(
        &self,
        id: Uuid,
        status: BatchStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut batches = self.batches.write().await;
        let batch = batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Batch {}", id)))?;

        batch.status = status;
        if completed_at.is_some() {
            batch.completed_at = completed_at;
        }
        Ok(())
    }

    async fn delete_all_batches(&self) -> Result<u64, StoreError> {
        let mut batches = self.batches.write().await;
        let removed = batches.len() as u64;
        batches.clear();
        self.items.write().await.clear();
        self.reports.write().await.clear();
        Ok(removed)
    }

    async fn insert_result_item(&self, item: &ResultItem) -> Result<(), StoreError> {
        self.items.write().await.push(item.clone());
        Ok(())
    }

    async fn existing_pattern_keys(
        &self,
        batch_id: Uuid,
    ) -> Result<HashSet<PatternKey>, StoreError> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.batch_id == batch_id)
            .map(|item| item.pattern_key())
            .collect())
    }

    async fn count_result_items(&self, batch_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.batch_id == batch_id)
            .count() as i64)
    }

    async fn top_result_items(
        &self,
        batch_id: Uuid,
        segment_filter: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ResultItem>, StoreError> {
        let mut matching: Vec<ResultItem> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.batch_id == batch_id)
            .filter(|item| segment_filter.map_or(true, |s| item.segment_id == s))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn insert_report(&self, report: &ScopeReport) -> Result<(), StoreError> {
        self.reports.write().await.push(report.clone());
        Ok(())
    }

    async fn finalize_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        sections: &[ReportSection],
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut reports = self.reports.write().await;
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Report {}", id)))?;

        report.status = status;
        report.sections = sections.to_vec();
        report.error = error.map(String::from);
        Ok(())
    }

    async fn reports_for_batch(&self, batch_id: Uuid) -> Result<Vec<ScopeReport>, StoreError> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn delete_reports_for_batch(&self, batch_id: Uuid) -> Result<u64, StoreError> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.batch_id != batch_id);
        Ok((before - reports.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConceptPayload, SubScores};

    fn item(batch_id: Uuid, segment: &str, theme: &str, composite: f64) -> ResultItem {
        ResultItem {
            id: Uuid::new_v4(),
            batch_id,
            segment_id: segment.to_string(),
            theme_id: theme.to_string(),
            payload: ConceptPayload {
                name: format!("{}-{}", segment, theme),
                description: String::new(),
                rationale: String::new(),
                next_steps: Vec::new(),
            },
            scores: SubScores {
                relevance: 3,
                feasibility: 3,
                impact: 3,
                novelty: 3,
            },
            composite_score: composite,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_batch_roundtrip_and_status() {
        let store = MemoryStore::new();
        let batch = ExplorationBatch::new(6);
        store.insert_batch(&batch).await.unwrap();

        let loaded = store.get_batch(batch.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BatchStatus::Running);

        store
            .set_batch_status(batch.id, BatchStatus::Cancelled, Some(Utc::now()))
            .await
            .unwrap();
        let loaded = store.get_batch(batch.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BatchStatus::Cancelled);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_existing_pattern_keys_only_for_batch() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert_result_item(&item(a, "s1", "t1", 3.0)).await.unwrap();
        store.insert_result_item(&item(a, "s1", "t2", 3.0)).await.unwrap();
        store.insert_result_item(&item(b, "s9", "t9", 3.0)).await.unwrap();

        let keys = store.existing_pattern_keys(a).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&PatternKey::new("s1", "t1")));
        assert!(!keys.contains(&PatternKey::new("s9", "t9")));
    }

    #[tokio::test]
    async fn test_top_result_items_orders_filters_truncates() {
        let store = MemoryStore::new();
        let batch_id = Uuid::new_v4();
        store.insert_result_item(&item(batch_id, "s1", "t1", 2.0)).await.unwrap();
        store.insert_result_item(&item(batch_id, "s1", "t2", 4.5)).await.unwrap();
        store.insert_result_item(&item(batch_id, "s2", "t1", 5.0)).await.unwrap();

        let all = store.top_result_items(batch_id, None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].composite_score, 5.0);
        assert_eq!(all[2].composite_score, 2.0);

        let s1 = store
            .top_result_items(batch_id, Some("s1"), 10)
            .await
            .unwrap();
        assert_eq!(s1.len(), 2);
        assert!(s1.iter().all(|i| i.segment_id == "s1"));

        let top1 = store.top_result_items(batch_id, None, 1).await.unwrap();
        assert_eq!(top1.len(), 1);
        assert_eq!(top1[0].composite_score, 5.0);
    }

    #[tokio::test]
    async fn test_delete_all_cascades() {
        let store = MemoryStore::new();
        let batch = ExplorationBatch::new(2);
        store.insert_batch(&batch).await.unwrap();
        store
            .insert_result_item(&item(batch.id, "s1", "t1", 3.0))
            .await
            .unwrap();
        store
            .insert_report(&ScopeReport::placeholder(batch.id, "overview", "Overview"))
            .await
            .unwrap();

        let removed = store.delete_all_batches().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.result_item_count().await, 0);
        assert!(store.reports_for_batch(batch.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_report() {
        let store = MemoryStore::new();
        let batch_id = Uuid::new_v4();
        let report = ScopeReport::placeholder(batch_id, "overview", "Overview");
        store.insert_report(&report).await.unwrap();

        store
            .finalize_report(
                report.id,
                ReportStatus::Completed,
                &[ReportSection::new("Top picks", "...")],
                None,
            )
            .await
            .unwrap();

        let reports = store.reports_for_batch(batch_id).await.unwrap();
        assert_eq!(reports[0].status, ReportStatus::Completed);
        assert_eq!(reports[0].sections.len(), 1);
    }
}
