//! Persisted calculation snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CalculationInput, ResultSet};

/// What the calculator saves between sessions: the raw field values and the
/// results they produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// RFC 3339 capture time
    pub timestamp: String,
    /// Field key → value
    pub inputs: BTreeMap<String, f64>,
    pub results: ResultSet,
}

impl Snapshot {
    /// Capture an input/result pair at the current time.
    pub fn capture(input: &CalculationInput, results: &ResultSet) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            inputs: input.to_field_map(),
            results: *results,
        }
    }

    /// Rebuild the typed input this snapshot was taken from.
    pub fn input(&self) -> CalculationInput {
        CalculationInput::from_field_map(&self.inputs)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A snapshot as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSnapshot {
    pub snapshot_id: String,
    pub snapshot: Snapshot,
}
