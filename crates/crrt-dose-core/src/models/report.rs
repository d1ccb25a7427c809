//! The full output of one engine run.

use serde::{Deserialize, Serialize};

use super::{CalculationInput, CalculationStep, Metric, ResultSet, Severity, Warning};

/// Everything the presentation layer needs to render one calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoseReport {
    /// The sanitized input the results were computed from
    pub input: CalculationInput,
    pub results: ResultSet,
    /// One step per metric, in `Metric::ALL` order
    pub steps: Vec<CalculationStep>,
    pub warnings: Vec<Warning>,
    pub interpretation: DilutionInterpretation,
    pub ranges: Vec<RangeCheck>,
}

impl DoseReport {
    /// Split into the (results, steps, warnings) triple.
    pub fn into_parts(self) -> (ResultSet, Vec<CalculationStep>, Vec<Warning>) {
        (self.results, self.steps, self.warnings)
    }

    /// Trace entry for a metric.
    pub fn step(&self, metric: Metric) -> Option<&CalculationStep> {
        self.steps.iter().find(|s| s.metric == metric)
    }

    /// Warnings at a given severity.
    pub fn warnings_with(&self, severity: Severity) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.severity == severity)
    }

    /// True if any error or danger warning was raised.
    pub fn has_blocking_warnings(&self) -> bool {
        self.warnings.iter().any(Warning::is_blocking)
    }
}

/// Dilution-factor band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DilutionBand {
    /// Severe clearance reduction
    Danger,
    /// Clearance may be reduced
    Caution,
    /// Clinically acceptable
    Acceptable,
    /// Best balance of clearance and filter life
    Optimal,
    /// Filter clogging risk
    FilterRisk,
}

/// Long-form dilution factor interpretation card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DilutionInterpretation {
    /// `None` when the factor could not be computed
    pub band: Option<DilutionBand>,
    pub status: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub details: String,
}

/// A recommended range and where the current value sits against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeCheck {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub current: f64,
    pub in_range: bool,
    pub description: String,
    pub note: String,
}
