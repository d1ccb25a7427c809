//! The five dose formulas.
//!
//! Each function returns the trace step for its metric; `result_value` is the
//! metric itself. Inputs are expected to be sanitized already.

use crate::models::{CalculationInput, CalculationStep, Metric};

const NOTE_NOT_FINITE: &str = "result is not a finite number";

/// Plasma flow (mL/hr) = BFR (mL/min) × 60 × (1 − Hct/100).
pub fn plasma_flow(input: &CalculationInput) -> CalculationStep {
    let bfr = input.prescription.blood_flow_rate;
    let hct = input.patient.hematocrit;
    let plasma_fraction = 1.0 - hct / 100.0;

    let value = bfr * 60.0 * plasma_fraction;

    step(
        Metric::PlasmaFlow,
        "Plasma flow = Blood flow rate × 60 × (1 - Hematocrit/100)",
        format!(
            "Plasma flow = {} mL/min × 60 × (1 - {}%) = {} × 60 × {:.3}",
            bfr, hct, bfr, plasma_fraction
        ),
        value,
        Some(format!("Blood flow rate: {} mL/min, Hematocrit: {}%", bfr, hct)),
    )
}

/// Prescribed (effluent) dose (mL/kg/hr) = total effluent / weight.
pub fn effluent_dose(input: &CalculationInput) -> CalculationStep {
    let p = &input.prescription;
    let weight = input.patient.weight;
    let formula = "Prescribed dose = (Pre-dilution + Post-dilution + Dialysate + UF) / Weight";
    let expression = format!(
        "Prescribed dose = ({} + {} + {} + {}) / {}",
        p.pre_dilution, p.post_dilution, p.dialysate, p.ultra_filtration, weight
    );

    if weight <= 0.0 {
        return guarded(Metric::EffluentDose, formula, expression, "weight is non-positive");
    }

    let total_effluent = p.pre_dilution + p.post_dilution + p.dialysate + p.ultra_filtration;
    step(Metric::EffluentDose, formula, expression, total_effluent / weight, None)
}

/// Filtration fraction (%) = convective flow / (plasma flow + pre-dilution) × 100.
pub fn filtration_fraction(input: &CalculationInput, plasma_flow: f64) -> CalculationStep {
    let p = &input.prescription;
    let formula =
        "Filtration fraction = (Pre-dilution + Post-dilution + UF) / (Plasma flow + Pre-dilution) × 100";
    let expression = format!(
        "Filtration fraction = ({} + {} + {}) / ({:.2} + {}) × 100",
        p.pre_dilution, p.post_dilution, p.ultra_filtration, plasma_flow, p.pre_dilution
    );

    let denominator = plasma_flow + p.pre_dilution;
    if denominator <= 0.0 {
        return guarded(
            Metric::FiltrationFraction,
            formula,
            expression,
            "denominator (plasma flow + pre-dilution) is non-positive",
        );
    }

    let convective_flow = p.pre_dilution + p.post_dilution + p.ultra_filtration;
    step(
        Metric::FiltrationFraction,
        formula,
        expression,
        convective_flow / denominator * 100.0,
        None,
    )
}

/// Dilution factor = plasma flow / (plasma flow + pre-dilution).
pub fn dilution_factor(input: &CalculationInput, plasma_flow: f64) -> CalculationStep {
    let pre = input.prescription.pre_dilution;
    let bfr = input.prescription.blood_flow_rate;
    let formula = "Dilution factor = Plasma flow / (Plasma flow + Pre-dilution)";
    let denominator = plasma_flow + pre;

    if denominator <= 0.0 {
        return guarded(
            Metric::DilutionFactor,
            formula,
            format!(
                "Dilution factor = {:.2} / ({:.2} + {})",
                plasma_flow, plasma_flow, pre
            ),
            "denominator (plasma flow + pre-dilution) is non-positive",
        );
    }

    step(
        Metric::DilutionFactor,
        formula,
        format!(
            "Dilution factor = {:.2} / ({:.2} + {}) = {:.2} / {:.2}",
            plasma_flow, plasma_flow, pre, plasma_flow, denominator
        ),
        plasma_flow / denominator,
        Some(format!(
            "Blood flow rate: {} mL/min → plasma flow: {:.2} mL/hr, pre-dilution: {} mL/hr",
            bfr, plasma_flow, pre
        )),
    )
}

/// Actual delivered dose (mL/kg/hr) = prescribed dose × runtime / prescribed time.
pub fn actual_delivered_dose(input: &CalculationInput, effluent_dose: f64) -> CalculationStep {
    let runtime = input.prescription.actual_runtime;
    let prescribed = input.prescription.prescribed_time;
    let formula = "Actual delivered dose = Prescribed dose × (Actual runtime / Prescribed time)";
    let expression = format!(
        "Actual delivered dose = {:.2} × ({} / {})",
        effluent_dose, runtime, prescribed
    );

    if prescribed <= 0.0 {
        return guarded(
            Metric::ActualDeliveredDose,
            formula,
            expression,
            "prescribed time is non-positive",
        );
    }

    step(
        Metric::ActualDeliveredDose,
        formula,
        expression,
        effluent_dose * (runtime / prescribed),
        None,
    )
}

/// Build a step, replacing a non-finite result with 0.
fn step(
    metric: Metric,
    formula: &str,
    substituted_expression: String,
    value: f64,
    detail: Option<String>,
) -> CalculationStep {
    let (result_value, note) = if value.is_finite() {
        (value, None)
    } else {
        tracing::warn!(metric = ?metric, "Non-finite result replaced with 0");
        (0.0, Some(NOTE_NOT_FINITE.to_string()))
    };

    CalculationStep {
        metric,
        formula: formula.to_string(),
        substituted_expression,
        result_value,
        unit: metric.unit().to_string(),
        detail,
        note,
    }
}

/// A step whose division guard fired.
fn guarded(
    metric: Metric,
    formula: &str,
    substituted_expression: String,
    reason: &str,
) -> CalculationStep {
    tracing::warn!(metric = ?metric, reason, "Division guard applied, result set to 0");
    CalculationStep {
        metric,
        formula: formula.to_string(),
        substituted_expression,
        result_value: 0.0,
        unit: metric.unit().to_string(),
        detail: None,
        note: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientInput, PrescriptionInput};

    fn input(weight: f64, hct: f64, bfr: f64, pre: f64, post: f64, dial: f64, uf: f64) -> CalculationInput {
        CalculationInput {
            patient: PatientInput {
                weight,
                hematocrit: hct,
            },
            prescription: PrescriptionInput {
                blood_flow_rate: bfr,
                pre_dilution: pre,
                post_dilution: post,
                dialysate: dial,
                ultra_filtration: uf,
                prescribed_time: 24.0,
                actual_runtime: 20.0,
            },
        }
    }

    #[test]
    fn test_plasma_flow() {
        let s = plasma_flow(&input(70.0, 30.0, 120.0, 0.0, 0.0, 0.0, 0.0));
        assert!((s.result_value - 5040.0).abs() < 1e-9);
        assert_eq!(s.unit, "mL/hr");
        assert_eq!(
            s.substituted_expression,
            "Plasma flow = 120 mL/min × 60 × (1 - 30%) = 120 × 60 × 0.700"
        );
        assert_eq!(s.display_result(), "5040.00");
        assert!(s.note.is_none());
        assert_eq!(
            s.detail.as_deref(),
            Some("Blood flow rate: 120 mL/min, Hematocrit: 30%")
        );
    }

    #[test]
    fn test_context_is_not_a_guard_note() {
        // Smallest clinical input: nothing guarded, context still attached.
        let mut i = input(1.0, 0.0, 50.0, 0.0, 0.0, 0.0, 0.0);
        i.prescription.prescribed_time = 1.0;
        let pf = plasma_flow(&i);
        let df = dilution_factor(&i, pf.result_value);

        assert!(pf.note.is_none());
        assert!(df.note.is_none());
        assert!(pf.detail.is_some());
        assert!(df.detail.is_some());
    }

    #[test]
    fn test_effluent_dose_weight_guard() {
        let s = effluent_dose(&input(0.0, 30.0, 120.0, 1000.0, 200.0, 1200.0, 50.0));
        assert_eq!(s.result_value, 0.0);
        assert_eq!(s.note.as_deref(), Some("weight is non-positive"));
    }

    #[test]
    fn test_effluent_dose() {
        let s = effluent_dose(&input(50.0, 30.0, 120.0, 600.0, 200.0, 600.0, 0.0));
        assert!((s.result_value - 28.0).abs() < 1e-9);
        assert!(s.note.is_none());
        assert_eq!(s.substituted_expression, "Prescribed dose = (600 + 200 + 600 + 0) / 50");
    }

    #[test]
    fn test_filtration_fraction() {
        let i = input(70.0, 30.0, 120.0, 1000.0, 200.0, 0.0, 50.0);
        let s = filtration_fraction(&i, 5040.0);
        assert!((s.result_value - 1250.0 / 6040.0 * 100.0).abs() < 1e-9);
        assert_eq!(s.display_result(), "20.70");
    }

    #[test]
    fn test_denominator_guards() {
        let i = input(70.0, 30.0, 0.0, 0.0, 200.0, 0.0, 50.0);
        let ff = filtration_fraction(&i, 0.0);
        let df = dilution_factor(&i, 0.0);
        assert_eq!(ff.result_value, 0.0);
        assert_eq!(df.result_value, 0.0);
        assert!(ff.note.is_some());
        assert!(df.note.is_some());
    }

    #[test]
    fn test_dilution_factor() {
        let i = input(70.0, 30.0, 120.0, 1000.0, 0.0, 0.0, 0.0);
        let s = dilution_factor(&i, 5040.0);
        assert_eq!(s.display_result(), "0.834");
        assert_eq!(s.unit, "");
        assert_eq!(
            s.substituted_expression,
            "Dilution factor = 5040.00 / (5040.00 + 1000) = 5040.00 / 6040.00"
        );
    }

    #[test]
    fn test_actual_delivered_dose() {
        let i = input(70.0, 30.0, 120.0, 0.0, 0.0, 0.0, 0.0);
        let s = actual_delivered_dose(&i, 30.0);
        assert!((s.result_value - 25.0).abs() < 1e-9);

        let mut zero_time = i;
        zero_time.prescription.prescribed_time = 0.0;
        let s = actual_delivered_dose(&zero_time, 30.0);
        assert_eq!(s.result_value, 0.0);
        assert_eq!(s.note.as_deref(), Some("prescribed time is non-positive"));
    }

    #[test]
    fn test_overflow_is_zeroed() {
        let i = input(70.0, 0.0, f64::MAX, 0.0, 0.0, 0.0, 0.0);
        let s = plasma_flow(&i);
        assert_eq!(s.result_value, 0.0);
        assert_eq!(s.note.as_deref(), Some(NOTE_NOT_FINITE));
        assert!(s.detail.is_some());
    }
}
