//! Weight-band prescription presets.

use serde::Serialize;

use crate::models::{CalculationInput, PatientInput, PrescriptionInput};

/// Defaults applied alongside a preset for fields the table doesn't cover.
pub const PRESET_HEMATOCRIT: f64 = 30.0;
pub const PRESET_ULTRA_FILTRATION: f64 = 50.0;
pub const PRESET_PRESCRIBED_TIME: f64 = 24.0;
pub const PRESET_ACTUAL_RUNTIME: f64 = 20.0;

/// Recommended starting prescription for a weight band.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuidelinePreset {
    /// e.g. "60-69"
    pub weight_band: &'static str,
    /// Representative weight for the band, kg
    pub weight: f64,
    /// mL/min
    pub blood_flow_rate: f64,
    /// mL/hr
    pub pre_dilution: f64,
    /// mL/hr
    pub post_dilution: f64,
    /// mL/hr
    pub dialysate: f64,
}

/// The preset table, lightest band first.
#[rustfmt::skip]
pub static PRESETS: [GuidelinePreset; 7] = [
    GuidelinePreset { weight_band: "40-49", weight: 44.5, blood_flow_rate: 120.0, pre_dilution: 600.0, post_dilution: 200.0, dialysate: 800.0 },
    GuidelinePreset { weight_band: "50-59", weight: 54.5, blood_flow_rate: 120.0, pre_dilution: 800.0, post_dilution: 200.0, dialysate: 1000.0 },
    GuidelinePreset { weight_band: "60-69", weight: 64.5, blood_flow_rate: 120.0, pre_dilution: 1000.0, post_dilution: 200.0, dialysate: 1200.0 },
    GuidelinePreset { weight_band: "70-79", weight: 74.5, blood_flow_rate: 140.0, pre_dilution: 1100.0, post_dilution: 300.0, dialysate: 1400.0 },
    GuidelinePreset { weight_band: "80-89", weight: 84.5, blood_flow_rate: 140.0, pre_dilution: 1300.0, post_dilution: 300.0, dialysate: 1600.0 },
    GuidelinePreset { weight_band: "90-99", weight: 94.5, blood_flow_rate: 160.0, pre_dilution: 1400.0, post_dilution: 400.0, dialysate: 1800.0 },
    GuidelinePreset { weight_band: "100+", weight: 105.0, blood_flow_rate: 160.0, pre_dilution: 1600.0, post_dilution: 400.0, dialysate: 2000.0 },
];

impl GuidelinePreset {
    /// Full calculation input for this preset, with the standard defaults
    /// for hematocrit, UF and run times.
    pub fn to_input(&self) -> CalculationInput {
        CalculationInput {
            patient: PatientInput {
                weight: self.weight,
                hematocrit: PRESET_HEMATOCRIT,
            },
            prescription: PrescriptionInput {
                blood_flow_rate: self.blood_flow_rate,
                pre_dilution: self.pre_dilution,
                post_dilution: self.post_dilution,
                dialysate: self.dialysate,
                ultra_filtration: PRESET_ULTRA_FILTRATION,
                prescribed_time: PRESET_PRESCRIBED_TIME,
                actual_runtime: PRESET_ACTUAL_RUNTIME,
            },
        }
    }
}

/// Look up a preset by its band label ("60-69", "100+").
pub fn preset_by_band(band: &str) -> Option<&'static GuidelinePreset> {
    let band = band.trim();
    PRESETS.iter().find(|p| p.weight_band.eq_ignore_ascii_case(band))
}

/// Pick the band a body weight falls into. Weights under 40 kg are outside
/// the table.
pub fn preset_for_weight(weight_kg: f64) -> Option<&'static GuidelinePreset> {
    if !weight_kg.is_finite() || weight_kg < 40.0 {
        return None;
    }
    let index = (((weight_kg - 40.0) / 10.0).floor() as usize).min(PRESETS.len() - 1);
    PRESETS.get(index)
}
