//! Database schema constants for the PostgreSQL backend.

/// SQL schema for the exploration_batches table.
pub const CREATE_BATCHES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exploration_batches (
    id UUID PRIMARY KEY,
    status VARCHAR(20) NOT NULL,
    total_patterns BIGINT NOT NULL,
    completed_patterns BIGINT NOT NULL DEFAULT 0,
    total_result_items BIGINT NOT NULL DEFAULT 0,
    current_chunk_label VARCHAR(255) NOT NULL DEFAULT '',
    errors JSONB NOT NULL DEFAULT '[]',
    started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at TIMESTAMPTZ
)
"#;

/// SQL schema for the result_items table.
pub const CREATE_RESULT_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS result_items (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES exploration_batches(id) ON DELETE CASCADE,
    segment_id VARCHAR(255) NOT NULL,
    theme_id VARCHAR(255) NOT NULL,
    payload JSONB NOT NULL,
    relevance_score SMALLINT NOT NULL,
    feasibility_score SMALLINT NOT NULL,
    impact_score SMALLINT NOT NULL,
    novelty_score SMALLINT NOT NULL,
    composite_score DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// SQL schema for the scope_reports table.
pub const CREATE_SCOPE_REPORTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS scope_reports (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES exploration_batches(id) ON DELETE CASCADE,
    scope_id VARCHAR(255) NOT NULL,
    scope_name VARCHAR(255) NOT NULL,
    status VARCHAR(20) NOT NULL,
    sections JSONB NOT NULL DEFAULT '[]',
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(batch_id, scope_id)
)
"#;

/// SQL for creating all required indexes.
pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_batches_status ON exploration_batches(status);
CREATE INDEX IF NOT EXISTS idx_result_items_batch_id ON result_items(batch_id);
CREATE INDEX IF NOT EXISTS idx_result_items_pattern ON result_items(batch_id, segment_id, theme_id);
CREATE INDEX IF NOT EXISTS idx_result_items_composite ON result_items(batch_id, composite_score DESC);
CREATE INDEX IF NOT EXISTS idx_scope_reports_batch_id ON scope_reports(batch_id)
"#;

/// Returns all schema creation statements in the correct order.
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_BATCHES_TABLE,
        CREATE_RESULT_ITEMS_TABLE,
        CREATE_SCOPE_REPORTS_TABLE,
        CREATE_INDEXES,
    ]
}
