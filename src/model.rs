//! Core domain types for exploration batches, result items and scope reports.
//!
//! Everything here is persisted through the [`crate::store::ExplorationStore`]
//! trait and mirrors what the store keeps authoritative: batch lifecycle,
//! progress counters, pattern-level errors, and synthesized reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an exploration batch.
///
/// A batch is created directly in `Running` and moves forward into exactly
/// one terminal state. It is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Running)
    }

    /// Parses a status from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(BatchStatus::Running),
            "completed" => Some(BatchStatus::Completed),
            "failed" => Some(BatchStatus::Failed),
            "cancelled" => Some(BatchStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Running => write!(f, "running"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Composite key identifying one unit of exploration work.
///
/// A pattern is not persisted by itself; its completion is inferred from the
/// existence of at least one [`ResultItem`] carrying the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternKey {
    /// Audience segment identifier (dimension A).
    pub segment_id: String,
    /// Opportunity theme identifier (dimension B).
    pub theme_id: String,
}

impl PatternKey {
    /// Creates a new pattern key.
    pub fn new(segment_id: impl Into<String>, theme_id: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            theme_id: theme_id.into(),
        }
    }

    /// Human-readable label used in progress strings and error entries.
    pub fn label(&self) -> String {
        format!("{}/{}", self.segment_id, self.theme_id)
    }
}

/// One pattern-level failure recorded on a batch.
///
/// Pattern failures never change the batch's terminal outcome; a batch can
/// reach `completed` with a non-empty error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternError {
    /// Label of the pattern that failed (see [`PatternKey::label`]).
    pub pattern_label: String,
    /// What went wrong (transport error or parse failure).
    pub message: String,
}

impl PatternError {
    /// Creates a new pattern error entry.
    pub fn new(pattern_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern_label: pattern_label.into(),
            message: message.into(),
        }
    }
}

/// One exploration run over the full pattern universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationBatch {
    /// Unique identifier.
    pub id: Uuid,
    /// Current lifecycle state.
    pub status: BatchStatus,
    /// Universe size, fixed at creation (|segments| x |themes|).
    pub total_patterns: i64,
    /// Patterns settled so far. Non-decreasing, never exceeds `total_patterns`.
    pub completed_patterns: i64,
    /// Result items persisted so far.
    pub total_result_items: i64,
    /// Descriptive label of the chunk currently in flight.
    pub current_chunk_label: String,
    /// Ordered pattern-level failures.
    pub errors: Vec<PatternError>,
    /// When the batch was created.
    pub started_at: DateTime<Utc>,
    /// Set once when the batch reaches a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExplorationBatch {
    /// Creates a new batch in `running` state for the given universe size.
    pub fn new(total_patterns: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: BatchStatus::Running,
            total_patterns,
            completed_patterns: 0,
            total_result_items: 0,
            current_chunk_label: String::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Normalized sub-scores of a generated concept, each in `[1, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub relevance: i16,
    pub feasibility: i16,
    pub impact: i16,
    pub novelty: i16,
}

impl SubScores {
    /// Sub-scores in a fixed order, for composite computation.
    pub fn as_array(&self) -> [i16; 4] {
        [self.relevance, self.feasibility, self.impact, self.novelty]
    }
}

/// The structured payload of one generated concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptPayload {
    pub name: String,
    pub description: String,
    pub rationale: String,
    /// Free-form suggested next steps.
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// One output of a successful pattern execution. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// Unique identifier.
    pub id: Uuid,
    /// Batch this item belongs to.
    pub batch_id: Uuid,
    /// Segment half of the pattern key, retained for scope filtering.
    pub segment_id: String,
    /// Theme half of the pattern key.
    pub theme_id: String,
    /// Generated concept content.
    pub payload: ConceptPayload,
    /// Normalized sub-scores.
    pub scores: SubScores,
    /// Derived aggregate, reproducible from `scores` alone.
    pub composite_score: f64,
    /// When the item was persisted.
    pub created_at: DateTime<Utc>,
}

impl ResultItem {
    /// Returns the pattern key this item was produced for.
    pub fn pattern_key(&self) -> PatternKey {
        PatternKey::new(self.segment_id.clone(), self.theme_id.clone())
    }
}

/// Lifecycle state of a scope report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
}

impl ReportStatus {
    /// Parses a status from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generating" => Some(ReportStatus::Generating),
            "completed" => Some(ReportStatus::Completed),
            "failed" => Some(ReportStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Generating => write!(f, "generating"),
            ReportStatus::Completed => write!(f, "completed"),
            ReportStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One titled section of a synthesized report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: String,
    pub body: String,
}

impl ReportSection {
    /// Creates a new report section.
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

/// One synthesized report for one scope of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeReport {
    /// Unique identifier.
    pub id: Uuid,
    /// Batch the report was synthesized from.
    pub batch_id: Uuid,
    /// Scope identifier (segment id, or the overview scope id).
    pub scope_id: String,
    /// Display name of the scope.
    pub scope_name: String,
    /// Current lifecycle state.
    pub status: ReportStatus,
    /// Structured synthesis output. Empty while `generating`.
    pub sections: Vec<ReportSection>,
    /// Last synthesis error, set only when `failed`.
    pub error: Option<String>,
    /// When the placeholder row was created.
    pub created_at: DateTime<Utc>,
}

impl ScopeReport {
    /// Creates a placeholder report row in `generating` state.
    pub fn placeholder(batch_id: Uuid, scope_id: impl Into<String>, scope_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id,
            scope_id: scope_id.into(),
            scope_name: scope_name.into(),
            status: ReportStatus::Generating,
            sections: Vec::new(),
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Read-only projection of a batch served to callers polling for progress.
///
/// When no batch row exists this degrades to an `idle` view instead of an
/// error. It is a convenience for polling UIs, not authoritative history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatusView {
    /// "idle" when no batch exists, otherwise the stored status string.
    pub state: String,
    pub batch_id: Option<Uuid>,
    pub total_patterns: i64,
    pub completed_patterns: i64,
    pub total_result_items: i64,
    pub current_chunk_label: String,
    pub error_count: usize,
}

impl BatchStatusView {
    /// The view returned when no batch row exists.
    pub fn idle() -> Self {
        Self {
            state: "idle".to_string(),
            batch_id: None,
            total_patterns: 0,
            completed_patterns: 0,
            total_result_items: 0,
            current_chunk_label: String::new(),
            error_count: 0,
        }
    }

    /// Projects a batch row into a status view.
    pub fn from_batch(batch: &ExplorationBatch) -> Self {
        Self {
            state: batch.status.to_string(),
            batch_id: Some(batch.id),
            total_patterns: batch.total_patterns,
            completed_patterns: batch.completed_patterns,
            total_result_items: batch.total_result_items,
            current_chunk_label: batch.current_chunk_label.clone(),
            error_count: batch.errors.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_status_roundtrip() {
        for status in [
            BatchStatus::Running,
            BatchStatus::Completed,
            BatchStatus::Failed,
            BatchStatus::Cancelled,
        ] {
            assert_eq!(BatchStatus::parse(&status.to_string()), Some(status));
        }
        assert_eq!(BatchStatus::parse("nonsense"), None);
    }

    #[test]
    fn test_batch_status_terminal() {
        assert!(!BatchStatus::Running.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(BatchStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_pattern_key_label() {
        let key = PatternKey::new("smb-retail", "automation");
        assert_eq!(key.label(), "smb-retail/automation");
    }

    #[test]
    fn test_new_batch_starts_running() {
        let batch = ExplorationBatch::new(12);
        assert_eq!(batch.status, BatchStatus::Running);
        assert_eq!(batch.total_patterns, 12);
        assert_eq!(batch.completed_patterns, 0);
        assert!(batch.completed_at.is_none());
        assert!(batch.errors.is_empty());
    }

    #[test]
    fn test_status_view_idle() {
        let view = BatchStatusView::idle();
        assert_eq!(view.state, "idle");
        assert!(view.batch_id.is_none());
    }

    #[test]
    fn test_status_view_from_batch() {
        let mut batch = ExplorationBatch::new(6);
        batch.completed_patterns = 4;
        batch.errors.push(PatternError::new("a/b", "boom"));

        let view = BatchStatusView::from_batch(&batch);
        assert_eq!(view.state, "running");
        assert_eq!(view.batch_id, Some(batch.id));
        assert_eq!(view.completed_patterns, 4);
        assert_eq!(view.error_count, 1);
    }

    #[test]
    fn test_report_status_roundtrip() {
        for status in [
            ReportStatus::Generating,
            ReportStatus::Completed,
            ReportStatus::Failed,
        ] {
            assert_eq!(ReportStatus::parse(&status.to_string()), Some(status));
        }
    }

    #[test]
    fn test_placeholder_report() {
        let batch_id = Uuid::new_v4();
        let report = ScopeReport::placeholder(batch_id, "overview", "Overview");
        assert_eq!(report.status, ReportStatus::Generating);
        assert!(report.sections.is_empty());
        assert!(report.error.is_none());
    }
}
