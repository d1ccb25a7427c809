//! Dilution factor interpretation card and recommended-range summary.

use crate::guideline::GuidelineThresholds;
use crate::models::{
    CalculationInput, DilutionBand, DilutionInterpretation, RangeCheck, ResultSet, Severity,
};

use super::rules::classify_dilution;

/// Long-form reading of the dilution factor.
pub fn interpret_dilution(
    results: &ResultSet,
    input: &CalculationInput,
    t: &GuidelineThresholds,
) -> DilutionInterpretation {
    let value = results.dilution_factor;
    let c = &t.dilution;

    if value <= 0.0 {
        return DilutionInterpretation {
            band: None,
            status: Severity::Error,
            title: "Not computable".into(),
            description: "Not enough input to compute the dilution factor.".into(),
            recommendation: "Enter the blood flow rate and pre-dilution.".into(),
            details: format!(
                "Current input: blood flow rate {} mL/min, pre-dilution {} mL/hr",
                input.prescription.blood_flow_rate, input.prescription.pre_dilution
            ),
        };
    }

    let band = classify_dilution(value, c);
    let target = format!("(recommended: {:.2}-{:.2})", c.acceptable_below, c.optimal_max);

    let (status, title, description, recommendation) = match band {
        DilutionBand::Optimal => (
            Severity::Success,
            "Optimal",
            "Provides the best balance of clearance efficiency and filter life.".to_string(),
            "Keep the current settings. This is the most efficient treatment condition."
                .to_string(),
        ),
        DilutionBand::Acceptable => (
            Severity::Success,
            "Appropriate",
            "Provides good clearance and is within a clinically appropriate range.".to_string(),
            format!(
                "Current settings are appropriate. Consider adjusting toward {:.2}-{:.2} if needed.",
                c.acceptable_below, c.optimal_max
            ),
        ),
        DilutionBand::Caution => (
            Severity::Warning,
            "Caution",
            "Clearance may be reduced; the prescription should be reviewed.".to_string(),
            format!(
                "Reduce pre-dilution or increase blood flow to bring the dilution factor to {:.2} or above.",
                c.caution_below
            ),
        ),
        DilutionBand::Danger => (
            Severity::Danger,
            "Danger",
            "Severe clearance reduction is expected; adjust immediately.".to_string(),
            format!(
                "Substantially reduce pre-dilution or increase blood flow to bring the dilution factor to {:.2} or above.",
                c.danger_below
            ),
        ),
        DilutionBand::FilterRisk => (
            Severity::Warning,
            "Caution",
            "Filter clogging risk increases and filter life may be shortened.".to_string(),
            format!(
                "Increase pre-dilution to bring the dilution factor to {:.2} or below.",
                c.optimal_max
            ),
        ),
    };

    let check = if band == DilutionBand::Optimal { " ✓" } else { "" };

    DilutionInterpretation {
        band: Some(band),
        status,
        title: title.into(),
        description,
        recommendation,
        details: format!("Current dilution factor: {:.3} {}{}", value, target, check),
    }
}

/// Where the key values sit against their recommended ranges.
///
/// The prescribed-dose range is checked against the dose actually delivered.
pub fn recommended_ranges(
    results: &ResultSet,
    input: &CalculationInput,
    t: &GuidelineThresholds,
) -> Vec<RangeCheck> {
    let check = |name: &str,
                 min: f64,
                 max: f64,
                 unit: &str,
                 current: f64,
                 description: &str,
                 note: &str| RangeCheck {
        name: name.to_string(),
        min,
        max,
        unit: unit.to_string(),
        current,
        in_range: current >= min && current <= max,
        description: description.to_string(),
        note: note.to_string(),
    };

    vec![
        check(
            "Prescribed dose (delivered)",
            t.effluent_dose_min,
            t.effluent_dose_display_max,
            "mL/kg/hr",
            results.actual_delivered_dose,
            "Typical CRRT prescribed dose range",
            "May need adjustment depending on patient condition.",
        ),
        check(
            "Filtration fraction",
            0.0,
            t.filtration_fraction_max,
            "%",
            results.filtration_fraction,
            "Filtration fraction limit",
            "Above the limit the risk of filter thrombosis increases.",
        ),
        check(
            "Blood flow rate",
            t.blood_flow_min,
            t.blood_flow_max,
            "mL/min",
            input.prescription.blood_flow_rate,
            "Recommended blood flow rate",
            "Adjust for weight and patient condition.",
        ),
        check(
            "Dilution factor",
            t.dilution.acceptable_below,
            t.dilution.optimal_max,
            "",
            results.dilution_factor,
            "Optimal dilution factor (ideal balance of clearance and filter life)",
            "This range provides the most efficient treatment.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_with_df(df: f64) -> ResultSet {
        ResultSet {
            dilution_factor: df,
            ..Default::default()
        }
    }

    #[test]
    fn test_unavailable_interpretation() {
        let mut input = CalculationInput::default();
        input.prescription.pre_dilution = 1000.0;
        let i = interpret_dilution(&results_with_df(0.0), &input, &GuidelineThresholds::default());

        assert!(i.band.is_none());
        assert_eq!(i.status, Severity::Error);
        assert_eq!(
            i.details,
            "Current input: blood flow rate 0 mL/min, pre-dilution 1000 mL/hr"
        );
    }

    #[test]
    fn test_acceptable_band_reads_as_success() {
        let i = interpret_dilution(
            &results_with_df(0.87),
            &CalculationInput::default(),
            &GuidelineThresholds::default(),
        );
        assert_eq!(i.band, Some(DilutionBand::Acceptable));
        assert_eq!(i.status, Severity::Success);
        assert_eq!(i.title, "Appropriate");
    }

    #[test]
    fn test_optimal_details_marked() {
        let i = interpret_dilution(
            &results_with_df(0.915),
            &CalculationInput::default(),
            &GuidelineThresholds::default(),
        );
        assert_eq!(
            i.details,
            "Current dilution factor: 0.915 (recommended: 0.90-0.93) ✓"
        );
    }

    #[test]
    fn test_ranges() {
        let mut input = CalculationInput::default();
        input.prescription.blood_flow_rate = 120.0;
        let results = ResultSet {
            actual_delivered_dose: 31.65,
            filtration_fraction: 20.7,
            dilution_factor: 0.834,
            ..Default::default()
        };

        let ranges = recommended_ranges(&results, &input, &GuidelineThresholds::default());
        assert_eq!(ranges.len(), 4);

        let in_range: Vec<bool> = ranges.iter().map(|r| r.in_range).collect();
        assert_eq!(in_range, vec![true, true, true, false]);
        assert_eq!(ranges[0].max, 35.0);
    }
}
