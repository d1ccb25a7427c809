//! Derived metrics and calculation trace models.

use serde::{Deserialize, Serialize};

/// The five derived CRRT metrics, in dependency order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    PlasmaFlow,
    EffluentDose,
    FiltrationFraction,
    DilutionFactor,
    ActualDeliveredDose,
}

impl Metric {
    /// Evaluation order; later metrics may read earlier ones.
    pub const ALL: [Metric; 5] = [
        Metric::PlasmaFlow,
        Metric::EffluentDose,
        Metric::FiltrationFraction,
        Metric::DilutionFactor,
        Metric::ActualDeliveredDose,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::PlasmaFlow => "Plasma flow",
            Metric::EffluentDose => "Prescribed dose",
            Metric::FiltrationFraction => "Filtration fraction",
            Metric::DilutionFactor => "Dilution factor",
            Metric::ActualDeliveredDose => "Actual delivered dose",
        }
    }

    /// Display unit (empty for the dimensionless dilution factor).
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::PlasmaFlow => "mL/hr",
            Metric::EffluentDose | Metric::ActualDeliveredDose => "mL/kg/hr",
            Metric::FiltrationFraction => "%",
            Metric::DilutionFactor => "",
        }
    }

    /// Decimal places used when displaying this metric.
    pub fn precision(&self) -> usize {
        match self {
            Metric::DilutionFactor => 3,
            _ => 2,
        }
    }

    /// Format a value of this metric for display.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.precision(), value)
    }
}

/// Result of one calculation. Always recomputed from scratch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultSet {
    /// mL/hr
    pub plasma_flow: f64,
    /// mL/kg/hr
    pub effluent_dose: f64,
    /// %
    pub filtration_fraction: f64,
    /// Unitless, nominally 0-1
    pub dilution_factor: f64,
    /// mL/kg/hr
    pub actual_delivered_dose: f64,
}

impl ResultSet {
    /// Value of a single metric.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PlasmaFlow => self.plasma_flow,
            Metric::EffluentDose => self.effluent_dose,
            Metric::FiltrationFraction => self.filtration_fraction,
            Metric::DilutionFactor => self.dilution_factor,
            Metric::ActualDeliveredDose => self.actual_delivered_dose,
        }
    }

    /// True if every metric is a finite number.
    pub fn is_finite(&self) -> bool {
        Metric::ALL.iter().all(|&m| self.get(m).is_finite())
    }
}

/// One line of the calculation trace shown next to the results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStep {
    pub metric: Metric,
    /// Formula template, e.g. "Plasma flow = BFR × 60 × (1 - Hct/100)"
    pub formula: String,
    /// The formula with actual numbers substituted
    pub substituted_expression: String,
    /// Full-precision result
    pub result_value: f64,
    pub unit: String,
    /// Input context shown under the expression
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
    /// Set only when a guard replaced the result
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl CalculationStep {
    /// Result rounded for display.
    pub fn display_result(&self) -> String {
        self.metric.format(self.result_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_precision() {
        assert_eq!(Metric::PlasmaFlow.format(5040.0), "5040.00");
        assert_eq!(Metric::DilutionFactor.format(5040.0 / 6040.0), "0.834");
        assert_eq!(Metric::FiltrationFraction.format(20.695364), "20.70");
    }

    #[test]
    fn test_result_set_serializes_camel_case() {
        let results = ResultSet {
            plasma_flow: 5040.0,
            ..Default::default()
        };
        let json = serde_json::to_value(results).unwrap();
        assert_eq!(json["plasmaFlow"], 5040.0);
        assert!(json.get("actualDeliveredDose").is_some());
    }
}
