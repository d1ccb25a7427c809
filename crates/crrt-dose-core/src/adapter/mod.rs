//! Input form adapter.
//!
//! Turns raw text fields (as typed into a form or passed on a command line)
//! into a [`CalculationInput`]. Range problems are reported as issues next to
//! the parsed input; they never stop the calculation.
//!
//! Handles:
//! - Number parsing (empty → 0, garbage → 0 plus an issue)
//! - Per-field min/max range checks
//! - Unknown field names

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::CalculationInput;

/// The nine input fields of the calculator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Weight,
    Hematocrit,
    BloodFlowRate,
    PreDilution,
    PostDilution,
    Dialysate,
    UltraFiltration,
    PrescribedTime,
    ActualRuntime,
}

impl FieldId {
    /// Form order.
    pub const ALL: [FieldId; 9] = [
        FieldId::Weight,
        FieldId::Hematocrit,
        FieldId::BloodFlowRate,
        FieldId::PreDilution,
        FieldId::PostDilution,
        FieldId::Dialysate,
        FieldId::UltraFiltration,
        FieldId::PrescribedTime,
        FieldId::ActualRuntime,
    ];

    /// Form/snapshot key.
    pub fn key(&self) -> &'static str {
        match self {
            FieldId::Weight => "weight",
            FieldId::Hematocrit => "hematocrit",
            FieldId::BloodFlowRate => "bloodFlowRate",
            FieldId::PreDilution => "preDilution",
            FieldId::PostDilution => "postDilution",
            FieldId::Dialysate => "dialysate",
            FieldId::UltraFiltration => "ultraFiltration",
            FieldId::PrescribedTime => "prescribedTime",
            FieldId::ActualRuntime => "actualRuntime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Weight => "Weight",
            FieldId::Hematocrit => "Hematocrit",
            FieldId::BloodFlowRate => "Blood flow rate",
            FieldId::PreDilution => "Pre-dilution",
            FieldId::PostDilution => "Post-dilution",
            FieldId::Dialysate => "Dialysate",
            FieldId::UltraFiltration => "UF",
            FieldId::PrescribedTime => "Prescribed time",
            FieldId::ActualRuntime => "Actual runtime",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            FieldId::Weight => "kg",
            FieldId::Hematocrit => "%",
            FieldId::BloodFlowRate => "mL/min",
            FieldId::PreDilution
            | FieldId::PostDilution
            | FieldId::Dialysate
            | FieldId::UltraFiltration => "mL/hr",
            FieldId::PrescribedTime | FieldId::ActualRuntime => "hr",
        }
    }

    /// Resolve a form key. Matching ignores case and `-`/`_` separators so
    /// "blood_flow_rate" and "blood-flow-rate" both work.
    pub fn from_key(key: &str) -> Option<FieldId> {
        let wanted: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.key().to_lowercase() == wanted)
    }
}

/// Inclusive accepted range for a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldRule {
    pub min: f64,
    pub max: f64,
}

impl FieldRule {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A problem with one raw field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssue {
    /// Not a number; the field was treated as 0
    InvalidNumber { field: FieldId, raw: String },
    /// Parsed, but outside the accepted range; the value is still used
    OutOfRange { field: FieldId, value: f64, rule: FieldRule },
    /// Key that doesn't name any field
    UnknownField { key: String },
}

impl FieldIssue {
    /// The field this issue belongs to, if any.
    pub fn field(&self) -> Option<FieldId> {
        match self {
            FieldIssue::InvalidNumber { field, .. } | FieldIssue::OutOfRange { field, .. } => {
                Some(*field)
            }
            FieldIssue::UnknownField { .. } => None,
        }
    }

    /// Message suitable for showing under the field.
    pub fn message(&self) -> String {
        match self {
            FieldIssue::InvalidNumber { field, raw } => {
                format!("{} must be a number (got \"{}\")", field.label(), raw)
            }
            FieldIssue::OutOfRange { field, rule, .. } => format!(
                "{} must be between {} and {} {}",
                field.label(),
                rule.min,
                rule.max,
                field.unit()
            ),
            FieldIssue::UnknownField { key } => format!("Unknown field: {}", key),
        }
    }
}

/// Output of [`InputForm::parse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedForm {
    /// Sanitized input, ready for the engine
    pub input: CalculationInput,
    pub issues: Vec<FieldIssue>,
}

impl ParsedForm {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Field validation rules for the calculator form.
pub struct InputForm {
    rules: HashMap<FieldId, FieldRule>,
}

impl Default for InputForm {
    fn default() -> Self {
        Self::new()
    }
}

impl InputForm {
    /// Create a form with the standard bedside ranges.
    pub fn new() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }

    /// Rule for a field.
    pub fn rule(&self, field: FieldId) -> Option<FieldRule> {
        self.rules.get(&field).copied()
    }

    /// Replace the rule for a field.
    pub fn set_rule(&mut self, field: FieldId, rule: FieldRule) {
        self.rules.insert(field, rule);
    }

    /// Parse one raw value. Blank input is 0 and not an issue.
    pub fn parse_value(&self, field: FieldId, raw: &str) -> (f64, Option<FieldIssue>) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return (0.0, None);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => (value, self.check_range(field, value)),
            _ => (
                0.0,
                Some(FieldIssue::InvalidNumber {
                    field,
                    raw: trimmed.to_string(),
                }),
            ),
        }
    }

    /// Validate one raw value without keeping the result.
    pub fn validate_field(&self, field: FieldId, raw: &str) -> Option<FieldIssue> {
        self.parse_value(field, raw).1
    }

    /// Range-check an already numeric value.
    pub fn check_range(&self, field: FieldId, value: f64) -> Option<FieldIssue> {
        let rule = self.rule(field)?;
        if rule.contains(value) {
            None
        } else {
            Some(FieldIssue::OutOfRange { field, value, rule })
        }
    }

    /// Range-check every field of a typed input.
    pub fn check_input(&self, input: &CalculationInput) -> Vec<FieldIssue> {
        FieldId::ALL
            .iter()
            .filter_map(|&f| self.check_range(f, input.get(f)))
            .collect()
    }

    /// Parse a set of raw key/value fields. Missing fields stay 0.
    pub fn parse<I, K, V>(&self, fields: I) -> ParsedForm
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut input = CalculationInput::default();
        let mut issues = Vec::new();

        for (key, raw) in fields {
            let key = key.as_ref();
            let Some(field) = FieldId::from_key(key) else {
                issues.push(FieldIssue::UnknownField {
                    key: key.to_string(),
                });
                continue;
            };
            let (value, issue) = self.parse_value(field, raw.as_ref());
            input.set(field, value);
            issues.extend(issue);
        }

        if !issues.is_empty() {
            tracing::debug!(issue_count = issues.len(), "Input form has issues");
        }

        ParsedForm {
            input: input.sanitized(),
            issues,
        }
    }

    /// Default bedside ranges.
    fn default_rules() -> HashMap<FieldId, FieldRule> {
        let mut map = HashMap::new();

        map.insert(FieldId::Weight, FieldRule { min: 0.1, max: 500.0 });
        map.insert(FieldId::Hematocrit, FieldRule { min: 0.0, max: 100.0 });
        map.insert(FieldId::BloodFlowRate, FieldRule { min: 1.0, max: 500.0 });

        // Replacement fluids and dialysate
        map.insert(FieldId::PreDilution, FieldRule { min: 0.0, max: 5000.0 });
        map.insert(FieldId::PostDilution, FieldRule { min: 0.0, max: 5000.0 });
        map.insert(FieldId::Dialysate, FieldRule { min: 0.0, max: 5000.0 });
        map.insert(FieldId::UltraFiltration, FieldRule { min: 0.0, max: 2000.0 });

        // Up to one week
        map.insert(FieldId::ActualRuntime, FieldRule { min: 0.0, max: 168.0 });
        map.insert(FieldId::PrescribedTime, FieldRule { min: 1.0, max: 168.0 });

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_variants() {
        assert_eq!(FieldId::from_key("bloodFlowRate"), Some(FieldId::BloodFlowRate));
        assert_eq!(FieldId::from_key("blood_flow_rate"), Some(FieldId::BloodFlowRate));
        assert_eq!(FieldId::from_key("Blood-Flow-Rate"), Some(FieldId::BloodFlowRate));
        assert_eq!(FieldId::from_key("uf"), None);
        for field in FieldId::ALL {
            assert_eq!(FieldId::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn test_parse_value() {
        let form = InputForm::new();

        assert_eq!(form.parse_value(FieldId::Weight, "70"), (70.0, None));
        assert_eq!(form.parse_value(FieldId::Weight, "  "), (0.0, None));

        let (value, issue) = form.parse_value(FieldId::Weight, "seventy");
        assert_eq!(value, 0.0);
        assert!(matches!(issue, Some(FieldIssue::InvalidNumber { .. })));

        let (value, issue) = form.parse_value(FieldId::Weight, "NaN");
        assert_eq!(value, 0.0);
        assert!(matches!(issue, Some(FieldIssue::InvalidNumber { .. })));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let form = InputForm::new();

        assert!(form.validate_field(FieldId::Weight, "0.1").is_none());
        assert!(form.validate_field(FieldId::Weight, "500").is_none());
        assert!(form.validate_field(FieldId::Weight, "0.05").is_some());
        assert!(form.validate_field(FieldId::PrescribedTime, "0").is_some());
        assert!(form.validate_field(FieldId::ActualRuntime, "0").is_none());
        assert!(form.validate_field(FieldId::UltraFiltration, "2001").is_some());
    }

    #[test]
    fn test_out_of_range_value_is_kept() {
        let form = InputForm::new();
        let parsed = form.parse([("bloodFlowRate", "650"), ("weight", "70")]);

        assert_eq!(parsed.input.prescription.blood_flow_rate, 650.0);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].field(), Some(FieldId::BloodFlowRate));
        assert_eq!(
            parsed.issues[0].message(),
            "Blood flow rate must be between 1 and 500 mL/min"
        );
    }

    #[test]
    fn test_parse_sanitizes_negative() {
        let form = InputForm::new();
        let parsed = form.parse([("weight", "-4")]);

        assert_eq!(parsed.input.patient.weight, 0.0);
        assert!(matches!(parsed.issues[0], FieldIssue::OutOfRange { .. }));
    }

    #[test]
    fn test_unknown_field() {
        let form = InputForm::new();
        let parsed = form.parse(vec![("potassium".to_string(), "4.1".to_string())]);

        assert!(!parsed.is_clean());
        assert_eq!(parsed.issues[0].field(), None);
    }

    #[test]
    fn test_check_input() {
        let form = InputForm::new();
        let input = crate::guideline::preset_by_band("60-69").unwrap().to_input();
        assert!(form.check_input(&input).is_empty());

        let empty = CalculationInput::default();
        let fields: Vec<_> = form
            .check_input(&empty)
            .iter()
            .filter_map(FieldIssue::field)
            .collect();
        assert_eq!(
            fields,
            vec![FieldId::Weight, FieldId::BloodFlowRate, FieldId::PrescribedTime]
        );
    }
}
