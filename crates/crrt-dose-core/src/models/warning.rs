//! Warning and interpretation models.

use serde::{Deserialize, Serialize};

/// Severity of a warning, ordered from most to least serious.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Danger,
    Warning,
    Info,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Success => "success",
        }
    }

    /// Heading shown above the message.
    pub fn heading(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Danger => "Danger",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Success => "Success",
        }
    }
}

/// Which rule produced a warning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    WeightNotPositive,
    PrescribedTimeNotPositive,
    EffluentDoseLow,
    EffluentDoseHigh,
    FiltrationFractionHigh,
    DeliveredDoseLow,
    BloodFlowLow,
    BloodFlowHigh,
    DilutionFactor,
}

/// A single advisory produced by the guideline rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub code: WarningCode,
    pub severity: Severity,
    pub message: String,
    /// Concrete adjustment the clinician can make
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub remediation: Option<String>,
}

impl Warning {
    pub fn new(code: WarningCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// True for severities that should block acting on the prescription.
    pub fn is_blocking(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Danger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
    }

    #[test]
    fn test_blocking() {
        let w = Warning::new(WarningCode::FiltrationFractionHigh, Severity::Error, "x");
        assert!(w.is_blocking());
        let w = Warning::new(WarningCode::DilutionFactor, Severity::Success, "x")
            .with_remediation("keep going");
        assert!(!w.is_blocking());
        assert_eq!(w.remediation.as_deref(), Some("keep going"));
    }
}
