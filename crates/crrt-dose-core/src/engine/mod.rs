//! Dose calculation engine.
//!
//! Pipeline: Sanitize → Plasma flow → Effluent dose → Filtration fraction
//! → Dilution factor → Delivered dose → Guideline rules
//!
//! The engine is a pure function of its input and thresholds. Degenerate
//! input never panics or errors; a guarded metric becomes 0 with a note on
//! its trace step, and invalid preconditions surface as error warnings.

mod formulas;
mod interpretation;
mod rules;

pub use formulas::*;
pub use interpretation::*;
pub use rules::*;

use crate::guideline::GuidelineThresholds;
use crate::models::{CalculationInput, DoseReport, ResultSet};

/// Calculation engine bound to a set of guideline thresholds.
#[derive(Debug, Clone, Default)]
pub struct DoseEngine {
    thresholds: GuidelineThresholds,
}

impl DoseEngine {
    /// Create an engine with custom thresholds.
    pub fn new(thresholds: GuidelineThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GuidelineThresholds {
        &self.thresholds
    }

    /// Compute all metrics, the trace and the warnings for one input.
    pub fn compute(&self, input: &CalculationInput) -> DoseReport {
        let input = input.sanitized();

        // Order matters: later formulas read earlier results.
        let plasma = plasma_flow(&input);
        let effluent = effluent_dose(&input);
        let filtration = filtration_fraction(&input, plasma.result_value);
        let dilution = dilution_factor(&input, plasma.result_value);
        let delivered = actual_delivered_dose(&input, effluent.result_value);

        let results = ResultSet {
            plasma_flow: plasma.result_value,
            effluent_dose: effluent.result_value,
            filtration_fraction: filtration.result_value,
            dilution_factor: dilution.result_value,
            actual_delivered_dose: delivered.result_value,
        };

        let warnings = evaluate(&input, &results, &self.thresholds);

        tracing::debug!(
            plasma_flow = results.plasma_flow,
            effluent_dose = results.effluent_dose,
            filtration_fraction = results.filtration_fraction,
            dilution_factor = results.dilution_factor,
            actual_delivered_dose = results.actual_delivered_dose,
            warning_count = warnings.len(),
            "Dose calculation complete"
        );

        DoseReport {
            input,
            results,
            steps: vec![plasma, effluent, filtration, dilution, delivered],
            warnings,
            interpretation: interpret_dilution(&results, &input, &self.thresholds),
            ranges: recommended_ranges(&results, &input, &self.thresholds),
        }
    }
}

/// Compute with the default guideline thresholds.
pub fn compute(input: &CalculationInput) -> DoseReport {
    DoseEngine::default().compute(input)
}
