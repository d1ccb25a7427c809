//! SQLite schema definition.

/// Complete database schema for the calculator's snapshot store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Calculation Snapshots (Append-only history, newest wins on restore)
-- ============================================================================

CREATE TABLE IF NOT EXISTS calculation_snapshots (
    snapshot_id TEXT PRIMARY KEY,
    taken_at TEXT NOT NULL,                      -- RFC 3339
    inputs TEXT NOT NULL DEFAULT '{}',           -- JSON object field -> value
    results TEXT NOT NULL,                       -- JSON ResultSet
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_snapshots_taken_at ON calculation_snapshots(taken_at);
"#;
