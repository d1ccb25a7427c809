//! Property tests for the dose engine.

use proptest::prelude::*;

use crrt_dose_core::engine::classify_dilution;
use crrt_dose_core::guideline::DilutionCutoffs;
use crrt_dose_core::models::DilutionBand;
use crrt_dose_core::{compute, CalculationInput, FieldId, WarningCode};

fn any_field_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => 0.0..5000.0f64,
        1 => -1000.0..0.0f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::MAX),
    ]
}

fn any_input() -> impl Strategy<Value = CalculationInput> {
    prop::array::uniform9(any_field_value()).prop_map(|values| {
        let mut input = CalculationInput::default();
        for (field, value) in FieldId::ALL.into_iter().zip(values) {
            input.set(field, value);
        }
        input
    })
}

fn clinical_input() -> impl Strategy<Value = CalculationInput> {
    (
        1.0..300.0f64,
        0.0..70.0f64,
        50.0..300.0f64,
        0.0..3000.0f64,
        0.0..3000.0f64,
        0.0..3000.0f64,
        0.0..500.0f64,
        1.0..48.0f64,
        0.0..48.0f64,
    )
        .prop_map(|(w, hct, bfr, pre, post, dial, uf, pt, rt)| {
            let mut input = CalculationInput::default();
            input.patient.weight = w;
            input.patient.hematocrit = hct;
            input.prescription.blood_flow_rate = bfr;
            input.prescription.pre_dilution = pre;
            input.prescription.post_dilution = post;
            input.prescription.dialysate = dial;
            input.prescription.ultra_filtration = uf;
            input.prescription.prescribed_time = pt;
            input.prescription.actual_runtime = rt;
            input
        })
}

proptest! {
    #[test]
    fn results_always_finite(input in any_input()) {
        let report = compute(&input);
        prop_assert!(report.results.is_finite());
        for step in &report.steps {
            prop_assert!(step.result_value.is_finite());
        }
    }

    #[test]
    fn compute_is_pure(input in any_input()) {
        prop_assert_eq!(compute(&input), compute(&input));
    }

    #[test]
    fn clinical_input_has_no_guard_notes(input in clinical_input()) {
        let report = compute(&input);
        prop_assert!(report.steps.iter().all(|s| s.note.is_none()));
        prop_assert!(!report.warnings.iter().any(|w| matches!(
            w.code,
            WarningCode::WeightNotPositive | WarningCode::PrescribedTimeNotPositive
        )));
    }

    #[test]
    fn at_most_one_dilution_warning(input in any_input()) {
        let report = compute(&input);
        let count = report
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::DilutionFactor)
            .count();
        prop_assert_eq!(count, usize::from(report.results.dilution_factor > 0.0));
    }

    #[test]
    fn dilution_bands_are_ordered(a in 0.0..2.0f64, b in 0.0..2.0f64) {
        let cutoffs = DilutionCutoffs::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let rank = |band: DilutionBand| match band {
            DilutionBand::Danger => 0,
            DilutionBand::Caution => 1,
            DilutionBand::Acceptable => 2,
            DilutionBand::Optimal => 3,
            DilutionBand::FilterRisk => 4,
        };
        prop_assert!(rank(classify_dilution(lo, &cutoffs)) <= rank(classify_dilution(hi, &cutoffs)));
    }
}

#[test]
fn dilution_band_edges() {
    let c = DilutionCutoffs::default();
    assert_eq!(classify_dilution(0.0, &c), DilutionBand::Danger);
    assert_eq!(classify_dilution(0.75, &c), DilutionBand::Caution);
    assert_eq!(classify_dilution(0.85, &c), DilutionBand::Acceptable);
    assert_eq!(classify_dilution(0.90, &c), DilutionBand::Optimal);
    assert_eq!(classify_dilution(0.93, &c), DilutionBand::Optimal);
    assert_eq!(classify_dilution(0.9301, &c), DilutionBand::FilterRisk);
}
