//! Snapshot database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Snapshot, StoredSnapshot};

impl Database {
    /// Store a snapshot and return its new ID.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> DbResult<String> {
        let snapshot_id = uuid::Uuid::new_v4().to_string();
        let inputs_json = serde_json::to_string(&snapshot.inputs)?;
        let results_json = serde_json::to_string(&snapshot.results)?;

        self.conn.execute(
            r#"
            INSERT INTO calculation_snapshots (
                snapshot_id, taken_at, inputs, results
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![snapshot_id, snapshot.timestamp, inputs_json, results_json],
        )?;

        tracing::info!(snapshot_id = %snapshot_id, "Saved calculation snapshot");
        Ok(snapshot_id)
    }

    /// Get a snapshot by ID.
    pub fn get_snapshot(&self, snapshot_id: &str) -> DbResult<Option<StoredSnapshot>> {
        self.conn
            .query_row(
                r#"
                SELECT snapshot_id, taken_at, inputs, results
                FROM calculation_snapshots
                WHERE snapshot_id = ?
                "#,
                [snapshot_id],
                SnapshotRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Most recently taken snapshot, if any.
    pub fn latest_snapshot(&self) -> DbResult<Option<StoredSnapshot>> {
        self.conn
            .query_row(
                r#"
                SELECT snapshot_id, taken_at, inputs, results
                FROM calculation_snapshots
                ORDER BY taken_at DESC, rowid DESC
                LIMIT 1
                "#,
                [],
                SnapshotRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List snapshots, newest first.
    pub fn list_snapshots(&self, limit: usize) -> DbResult<Vec<StoredSnapshot>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT snapshot_id, taken_at, inputs, results
            FROM calculation_snapshots
            ORDER BY taken_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], SnapshotRow::from_row)?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?.try_into()?);
        }
        Ok(snapshots)
    }

    /// Count stored snapshots.
    pub fn count_snapshots(&self) -> DbResult<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM calculation_snapshots", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Delete a single snapshot.
    pub fn delete_snapshot(&self, snapshot_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM calculation_snapshots WHERE snapshot_id = ?",
            [snapshot_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete every snapshot. Returns how many were removed.
    pub fn clear_snapshots(&self) -> DbResult<usize> {
        let removed = self.conn.execute("DELETE FROM calculation_snapshots", [])?;
        tracing::info!(removed, "Cleared calculation snapshots");
        Ok(removed)
    }
}

/// Internal row type for database deserialization.
struct SnapshotRow {
    snapshot_id: String,
    taken_at: String,
    inputs: String,
    results: String,
}

impl SnapshotRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            snapshot_id: row.get(0)?,
            taken_at: row.get(1)?,
            inputs: row.get(2)?,
            results: row.get(3)?,
        })
    }
}

impl TryFrom<SnapshotRow> for StoredSnapshot {
    type Error = DbError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        Ok(StoredSnapshot {
            snapshot_id: row.snapshot_id,
            snapshot: Snapshot {
                timestamp: row.taken_at,
                inputs: serde_json::from_str(&row.inputs)?,
                results: serde_json::from_str(&row.results)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationInput, ResultSet};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn snapshot_at(timestamp: &str, weight: f64) -> Snapshot {
        let mut input = CalculationInput::default();
        input.patient.weight = weight;
        let mut snapshot = Snapshot::capture(&input, &ResultSet::default());
        snapshot.timestamp = timestamp.to_string();
        snapshot
    }

    #[test]
    fn test_save_and_get() {
        let db = setup_db();
        let snapshot = snapshot_at("2024-05-01T10:00:00+00:00", 64.5);

        let id = db.save_snapshot(&snapshot).unwrap();
        let stored = db.get_snapshot(&id).unwrap().unwrap();

        assert_eq!(stored.snapshot_id, id);
        assert_eq!(stored.snapshot, snapshot);
    }

    #[test]
    fn test_latest_is_newest() {
        let db = setup_db();
        assert!(db.latest_snapshot().unwrap().is_none());

        db.save_snapshot(&snapshot_at("2024-05-01T10:00:00+00:00", 60.0)).unwrap();
        db.save_snapshot(&snapshot_at("2024-05-03T10:00:00+00:00", 80.0)).unwrap();
        db.save_snapshot(&snapshot_at("2024-05-02T10:00:00+00:00", 70.0)).unwrap();

        let latest = db.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.snapshot.inputs["weight"], 80.0);

        let listed = db.list_snapshots(2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].snapshot.inputs["weight"], 70.0);
    }

    #[test]
    fn test_delete_and_clear() {
        let db = setup_db();
        let id = db.save_snapshot(&snapshot_at("2024-05-01T10:00:00+00:00", 60.0)).unwrap();
        db.save_snapshot(&snapshot_at("2024-05-02T10:00:00+00:00", 70.0)).unwrap();
        assert_eq!(db.count_snapshots().unwrap(), 2);

        assert!(db.delete_snapshot(&id).unwrap());
        assert!(!db.delete_snapshot(&id).unwrap());
        assert_eq!(db.count_snapshots().unwrap(), 1);

        assert_eq!(db.clear_snapshots().unwrap(), 1);
        assert!(db.latest_snapshot().unwrap().is_none());
    }
}
