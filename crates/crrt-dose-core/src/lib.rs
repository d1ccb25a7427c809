//! CRRT Dose Core Library
//!
//! Dose calculation and guideline checking for Continuous Renal Replacement
//! Therapy, with a local snapshot store.
//!
//! # Architecture
//!
//! ```text
//! Raw form fields ──► Input Form Adapter ──► CalculationInput
//!                                                  │
//!                                        ┌─────────▼─────────┐
//!                                        │    Dose Engine    │
//!                                        │  5 formulas       │
//!                                        │  guideline rules  │
//!                                        └─────────┬─────────┘
//!                                                  │
//!                     ┌────────────────────────────┼────────────────────┐
//!                     ▼                            ▼                    ▼
//!               ResultSet + trace             Warnings          Snapshot store
//!                                        (with remediation)        (SQLite)
//! ```
//!
//! # Core Principle
//!
//! **The engine never fails.** Degenerate input yields 0-valued metrics with
//! a note and error-severity warnings, not errors or panics.
//!
//! # Modules
//!
//! - [`engine`]: The five formulas, guideline rules and interpretation
//! - [`models`]: Domain types (CalculationInput, ResultSet, Warning, etc.)
//! - [`guideline`]: Thresholds configuration and weight-band presets
//! - [`adapter`]: Raw text field parsing and range validation
//! - [`db`]: SQLite snapshot persistence

pub mod adapter;
pub mod db;
pub mod engine;
pub mod guideline;
pub mod models;

// Re-export commonly used types
pub use adapter::{FieldId, FieldIssue, InputForm, ParsedForm};
pub use db::Database;
pub use engine::{compute, DoseEngine};
pub use guideline::{GuidelinePreset, GuidelineThresholds, PRESETS};
pub use models::{
    CalculationInput, CalculationStep, DoseReport, Metric, PatientInput, PrescriptionInput,
    ResultSet, Severity, Snapshot, StoredSnapshot, Warning, WarningCode,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CrrtDoseError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for CrrtDoseError {
    fn from(e: db::DbError) -> Self {
        CrrtDoseError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for CrrtDoseError {
    fn from(e: serde_json::Error) -> Self {
        CrrtDoseError::SerializationError(e.to_string())
    }
}

impl From<guideline::ConfigError> for CrrtDoseError {
    fn from(e: guideline::ConfigError) -> Self {
        CrrtDoseError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CrrtDoseError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CrrtDoseError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Stateless Functions (exported to FFI)
// =========================================================================

/// Run the dose engine with the default guideline thresholds.
#[uniffi::export]
pub fn compute_dose(input: FfiCalculationInput) -> FfiDoseReport {
    engine::compute(&input.into()).into()
}

/// Run the dose engine with thresholds given as JSON.
#[uniffi::export]
pub fn compute_dose_with_thresholds(
    input: FfiCalculationInput,
    thresholds_json: String,
) -> Result<FfiDoseReport, CrrtDoseError> {
    let thresholds = GuidelineThresholds::from_json(&thresholds_json)?;
    Ok(DoseEngine::new(thresholds).compute(&input.into()).into())
}

/// Parse raw form fields. Issues are returned alongside the input.
#[uniffi::export]
pub fn parse_form_fields(fields: std::collections::HashMap<String, String>) -> FfiParsedForm {
    InputForm::new().parse(fields).into()
}

/// The weight-band preset table.
#[uniffi::export]
pub fn guideline_presets() -> Vec<FfiGuidelinePreset> {
    PRESETS.iter().map(|p| p.into()).collect()
}

/// Full input for a preset band label such as "60-69".
#[uniffi::export]
pub fn preset_input(weight_band: String) -> Result<FfiCalculationInput, CrrtDoseError> {
    guideline::preset_by_band(&weight_band)
        .map(|p| p.to_input().into())
        .ok_or_else(|| CrrtDoseError::InvalidInput(format!("Unknown weight band: {}", weight_band)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a snapshot database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<CrrtDoseCore>, CrrtDoseError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(CrrtDoseCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<CrrtDoseCore>, CrrtDoseError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(CrrtDoseCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe snapshot store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CrrtDoseCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl CrrtDoseCore {
    /// Compute a report and save the input/result snapshot.
    pub fn save_calculation(
        &self,
        input: FfiCalculationInput,
    ) -> Result<FfiSavedCalculation, CrrtDoseError> {
        let report = engine::compute(&input.into());
        let snapshot = Snapshot::capture(&report.input, &report.results);

        let db = self.db.lock()?;
        let snapshot_id = db.save_snapshot(&snapshot)?;

        Ok(FfiSavedCalculation {
            snapshot_id,
            timestamp: snapshot.timestamp,
            report: report.into(),
        })
    }

    /// Restore the most recent snapshot as a freshly computed report.
    pub fn latest_snapshot(&self) -> Result<Option<FfiSavedCalculation>, CrrtDoseError> {
        let db = self.db.lock()?;
        let stored = db.latest_snapshot()?;
        Ok(stored.map(|s| FfiSavedCalculation {
            report: engine::compute(&s.snapshot.input()).into(),
            snapshot_id: s.snapshot_id,
            timestamp: s.snapshot.timestamp,
        }))
    }

    /// Latest snapshot exactly as stored, as JSON.
    pub fn latest_snapshot_json(&self) -> Result<Option<String>, CrrtDoseError> {
        let db = self.db.lock()?;
        match db.latest_snapshot()? {
            Some(stored) => Ok(Some(stored.snapshot.to_json()?)),
            None => Ok(None),
        }
    }

    /// Number of stored snapshots.
    pub fn snapshot_count(&self) -> Result<u32, CrrtDoseError> {
        let db = self.db.lock()?;
        Ok(db.count_snapshots()?)
    }

    /// Delete every stored snapshot.
    pub fn clear_snapshots(&self) -> Result<u32, CrrtDoseError> {
        let db = self.db.lock()?;
        Ok(db.clear_snapshots()? as u32)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe calculation input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCalculationInput {
    pub weight: f64,
    pub hematocrit: f64,
    pub blood_flow_rate: f64,
    pub pre_dilution: f64,
    pub post_dilution: f64,
    pub dialysate: f64,
    pub ultra_filtration: f64,
    pub prescribed_time: f64,
    pub actual_runtime: f64,
}

impl From<FfiCalculationInput> for CalculationInput {
    fn from(input: FfiCalculationInput) -> Self {
        CalculationInput {
            patient: PatientInput {
                weight: input.weight,
                hematocrit: input.hematocrit,
            },
            prescription: PrescriptionInput {
                blood_flow_rate: input.blood_flow_rate,
                pre_dilution: input.pre_dilution,
                post_dilution: input.post_dilution,
                dialysate: input.dialysate,
                ultra_filtration: input.ultra_filtration,
                prescribed_time: input.prescribed_time,
                actual_runtime: input.actual_runtime,
            },
        }
    }
}

impl From<CalculationInput> for FfiCalculationInput {
    fn from(input: CalculationInput) -> Self {
        Self {
            weight: input.patient.weight,
            hematocrit: input.patient.hematocrit,
            blood_flow_rate: input.prescription.blood_flow_rate,
            pre_dilution: input.prescription.pre_dilution,
            post_dilution: input.prescription.post_dilution,
            dialysate: input.prescription.dialysate,
            ultra_filtration: input.prescription.ultra_filtration,
            prescribed_time: input.prescription.prescribed_time,
            actual_runtime: input.prescription.actual_runtime,
        }
    }
}

/// FFI-safe dose report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseReport {
    pub plasma_flow: f64,
    pub effluent_dose: f64,
    pub filtration_fraction: f64,
    pub dilution_factor: f64,
    pub actual_delivered_dose: f64,
    pub steps: Vec<FfiCalculationStep>,
    pub warnings: Vec<FfiWarning>,
    pub interpretation_status: String,
    pub interpretation_title: String,
    pub interpretation_recommendation: String,
}

impl From<DoseReport> for FfiDoseReport {
    fn from(report: DoseReport) -> Self {
        Self {
            plasma_flow: report.results.plasma_flow,
            effluent_dose: report.results.effluent_dose,
            filtration_fraction: report.results.filtration_fraction,
            dilution_factor: report.results.dilution_factor,
            actual_delivered_dose: report.results.actual_delivered_dose,
            steps: report.steps.into_iter().map(|s| s.into()).collect(),
            warnings: report.warnings.into_iter().map(|w| w.into()).collect(),
            interpretation_status: report.interpretation.status.as_str().to_string(),
            interpretation_title: report.interpretation.title,
            interpretation_recommendation: report.interpretation.recommendation,
        }
    }
}

/// FFI-safe calculation step.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCalculationStep {
    pub metric: String,
    pub formula: String,
    pub substituted_expression: String,
    pub result_value: f64,
    /// Rounded for display
    pub display_result: String,
    pub unit: String,
    pub detail: Option<String>,
    /// Set only when a guard replaced the result
    pub note: Option<String>,
}

impl From<CalculationStep> for FfiCalculationStep {
    fn from(step: CalculationStep) -> Self {
        Self {
            metric: step.metric.label().to_string(),
            display_result: step.display_result(),
            formula: step.formula,
            substituted_expression: step.substituted_expression,
            result_value: step.result_value,
            unit: step.unit,
            detail: step.detail,
            note: step.note,
        }
    }
}

/// FFI-safe warning.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWarning {
    pub severity: String,
    pub message: String,
    pub remediation: Option<String>,
}

impl From<Warning> for FfiWarning {
    fn from(warning: Warning) -> Self {
        Self {
            severity: warning.severity.as_str().to_string(),
            message: warning.message,
            remediation: warning.remediation,
        }
    }
}

/// FFI-safe parsed form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiParsedForm {
    pub input: FfiCalculationInput,
    pub issues: Vec<FfiFieldIssue>,
}

/// FFI-safe field issue.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldIssue {
    /// Form key, `None` for unknown fields
    pub field: Option<String>,
    pub message: String,
}

impl From<ParsedForm> for FfiParsedForm {
    fn from(parsed: ParsedForm) -> Self {
        Self {
            input: parsed.input.into(),
            issues: parsed
                .issues
                .iter()
                .map(|issue| FfiFieldIssue {
                    field: issue.field().map(|f| f.key().to_string()),
                    message: issue.message(),
                })
                .collect(),
        }
    }
}

/// FFI-safe guideline preset.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGuidelinePreset {
    pub weight_band: String,
    pub weight: f64,
    pub blood_flow_rate: f64,
    pub pre_dilution: f64,
    pub post_dilution: f64,
    pub dialysate: f64,
}

impl From<&GuidelinePreset> for FfiGuidelinePreset {
    fn from(preset: &GuidelinePreset) -> Self {
        Self {
            weight_band: preset.weight_band.to_string(),
            weight: preset.weight,
            blood_flow_rate: preset.blood_flow_rate,
            pre_dilution: preset.pre_dilution,
            post_dilution: preset.post_dilution,
            dialysate: preset.dialysate,
        }
    }
}

/// FFI-safe saved calculation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSavedCalculation {
    pub snapshot_id: String,
    pub timestamp: String,
    pub report: FfiDoseReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sixties() -> FfiCalculationInput {
        preset_input("60-69".into()).unwrap()
    }

    #[test]
    fn test_compute_dose_ffi() {
        let report = compute_dose(sixties());
        assert!((report.plasma_flow - 5040.0).abs() < 1e-9);
        assert_eq!(report.steps.len(), 5);
        assert_eq!(report.steps[3].display_result, "0.834");
        assert_eq!(report.interpretation_status, "warning");
    }

    #[test]
    fn test_compute_with_bad_thresholds() {
        let err = compute_dose_with_thresholds(sixties(), "{\"blood_flow_max\": -3}".into())
            .unwrap_err();
        assert!(matches!(err, CrrtDoseError::ConfigError(_)));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            preset_input("20-29".into()),
            Err(CrrtDoseError::InvalidInput(_))
        ));
        assert_eq!(guideline_presets().len(), 7);
    }

    #[test]
    fn test_parse_form_fields_ffi() {
        let mut fields = std::collections::HashMap::new();
        fields.insert("weight".to_string(), "abc".to_string());
        fields.insert("hematocrit".to_string(), "30".to_string());

        let parsed = parse_form_fields(fields);
        assert_eq!(parsed.input.weight, 0.0);
        assert_eq!(parsed.input.hematocrit, 30.0);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].field.as_deref(), Some("weight"));
    }

    #[test]
    fn test_core_save_and_restore() {
        let core = open_database_in_memory().unwrap();
        assert!(core.latest_snapshot().unwrap().is_none());

        let saved = core.save_calculation(sixties()).unwrap();
        let restored = core.latest_snapshot().unwrap().unwrap();

        assert_eq!(restored.snapshot_id, saved.snapshot_id);
        assert_eq!(restored.report.effluent_dose, saved.report.effluent_dose);
        assert!(core.latest_snapshot_json().unwrap().unwrap().contains("\"inputs\""));
        assert_eq!(core.snapshot_count().unwrap(), 1);
        assert_eq!(core.clear_snapshots().unwrap(), 1);
        assert_eq!(core.snapshot_count().unwrap(), 0);
    }
}
