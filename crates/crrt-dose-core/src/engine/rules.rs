//! Guideline warning rules.
//!
//! Every rule is evaluated independently; all that apply are returned, in a
//! fixed order.

use crate::guideline::{DilutionCutoffs, GuidelineThresholds};
use crate::models::{
    CalculationInput, DilutionBand, ResultSet, Severity, Warning, WarningCode,
};

/// Map a dilution factor onto its band. Total over all finite values.
pub fn classify_dilution(value: f64, cutoffs: &DilutionCutoffs) -> DilutionBand {
    if value < cutoffs.danger_below {
        DilutionBand::Danger
    } else if value < cutoffs.caution_below {
        DilutionBand::Caution
    } else if value < cutoffs.acceptable_below {
        DilutionBand::Acceptable
    } else if value <= cutoffs.optimal_max {
        DilutionBand::Optimal
    } else {
        DilutionBand::FilterRisk
    }
}

/// Run every rule against one calculation.
pub fn evaluate(
    input: &CalculationInput,
    results: &ResultSet,
    t: &GuidelineThresholds,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let weight = input.patient.weight;
    let bfr = input.prescription.blood_flow_rate;

    // Hard preconditions
    if weight <= 0.0 {
        warnings.push(
            Warning::new(
                WarningCode::WeightNotPositive,
                Severity::Error,
                format!("Weight must be positive (current: {} kg)", weight),
            )
            .with_remediation("Enter a valid weight (0.1-500 kg)"),
        );
    }

    if input.prescription.prescribed_time <= 0.0 {
        warnings.push(
            Warning::new(
                WarningCode::PrescribedTimeNotPositive,
                Severity::Error,
                "Prescribed time must be positive",
            )
            .with_remediation("Enter a valid prescribed time"),
        );
    }

    // Prescribed dose. Anything up to the upper limit is accepted headroom.
    let dose = results.effluent_dose;
    if dose > 0.0 && dose < t.effluent_dose_min {
        warnings.push(
            Warning::new(
                WarningCode::EffluentDoseLow,
                Severity::Warning,
                format!(
                    "Prescribed dose is below the recommended range ({}-{} mL/kg/hr): {:.1} mL/kg/hr",
                    t.effluent_dose_min, t.effluent_dose_max, dose
                ),
            )
            .with_remediation(format!(
                "Consider adjusting to {}-{} mL/kg/hr depending on patient condition",
                t.effluent_dose_min, t.effluent_dose_max
            )),
        );
    }

    if dose > t.effluent_dose_max {
        warnings.push(
            Warning::new(
                WarningCode::EffluentDoseHigh,
                Severity::Warning,
                format!(
                    "Prescribed dose exceeds the guideline range: {:.1} mL/kg/hr",
                    dose
                ),
            )
            .with_remediation(format!(
                "Consider adjusting the prescribed dose to {}-{} mL/kg/hr",
                t.effluent_dose_min, t.effluent_dose_max
            )),
        );
    }

    // Filtration fraction (thrombosis risk)
    if results.filtration_fraction > t.filtration_fraction_max {
        warnings.push(
            Warning::new(
                WarningCode::FiltrationFractionHigh,
                Severity::Error,
                format!(
                    "Filtration fraction exceeds the {}% safety limit: {:.1}%",
                    t.filtration_fraction_max, results.filtration_fraction
                ),
            )
            .with_remediation(format!(
                "Adjust the filtration fraction to {}% or below",
                t.filtration_fraction_max
            )),
        );
    }

    let delivered = results.actual_delivered_dose;
    if delivered > 0.0 && delivered < t.delivered_dose_min {
        warnings.push(
            Warning::new(
                WarningCode::DeliveredDoseLow,
                Severity::Warning,
                format!("Actual delivered dose is insufficient: {:.1} mL/kg/hr", delivered),
            )
            .with_remediation("Extend the runtime or adjust the prescription"),
        );
    }

    // Blood flow
    if bfr > 0.0 && bfr < t.blood_flow_min {
        warnings.push(
            Warning::new(
                WarningCode::BloodFlowLow,
                Severity::Warning,
                format!(
                    "Blood flow rate is below the recommended range ({}-{} mL/min): {} mL/min",
                    t.blood_flow_min, t.blood_flow_max, bfr
                ),
            )
            .with_remediation(format!(
                "Raise the blood flow rate to at least {} mL/min",
                t.blood_flow_min
            )),
        );
    }

    if bfr > t.blood_flow_max {
        warnings.push(
            Warning::new(
                WarningCode::BloodFlowHigh,
                Severity::Warning,
                format!(
                    "Blood flow rate is above the recommended range ({}-{} mL/min): {} mL/min",
                    t.blood_flow_min, t.blood_flow_max, bfr
                ),
            )
            .with_remediation(format!(
                "Lower the blood flow rate to {} mL/min or less",
                t.blood_flow_max
            )),
        );
    }

    if results.dilution_factor > 0.0 {
        warnings.push(dilution_warning(results.dilution_factor, &t.dilution));
    }

    warnings
}

/// The single dilution-factor advisory for a computed factor.
pub fn dilution_warning(value: f64, c: &DilutionCutoffs) -> Warning {
    let (severity, message, remediation) = match classify_dilution(value, c) {
        DilutionBand::Danger => (
            Severity::Danger,
            "Dilution factor is at a dangerous level",
            format!(
                "Substantially reduce pre-dilution or increase blood flow to bring the dilution factor to {:.2} or above. Severe clearance reduction is expected.",
                c.danger_below
            ),
        ),
        DilutionBand::Caution => (
            Severity::Warning,
            "Dilution factor is at a caution level",
            format!(
                "Reduce pre-dilution or increase blood flow to bring the dilution factor to {:.2} or above. Clearance may be reduced.",
                c.caution_below
            ),
        ),
        DilutionBand::Acceptable => (
            Severity::Info,
            "Dilution factor is in the acceptable range",
            format!(
                "Current settings are appropriate. Consider adjusting toward {:.2}-{:.2} if needed.",
                c.acceptable_below, c.optimal_max
            ),
        ),
        DilutionBand::Optimal => (
            Severity::Success,
            "Dilution factor is in the optimal range",
            "Current settings are optimal, giving the ideal balance of clearance efficiency and filter life.".to_string(),
        ),
        DilutionBand::FilterRisk => (
            Severity::Warning,
            "Dilution factor is at a caution level",
            format!(
                "Increase pre-dilution to bring the dilution factor to {:.2} or below. Filter clogging risk may increase.",
                c.optimal_max
            ),
        ),
    };

    Warning::new(
        WarningCode::DilutionFactor,
        severity,
        format!("{}: {:.3}", message, value),
    )
    .with_remediation(remediation)
}
