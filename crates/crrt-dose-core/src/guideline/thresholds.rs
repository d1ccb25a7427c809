//! Guideline thresholds used by the warning rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigResult};

/// Dilution factor band cut-offs, ascending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DilutionCutoffs {
    /// Below this: danger
    pub danger_below: f64,
    /// Below this: caution
    pub caution_below: f64,
    /// Below this: acceptable
    pub acceptable_below: f64,
    /// Up to and including this: optimal. Above: filter clogging risk.
    pub optimal_max: f64,
}

impl Default for DilutionCutoffs {
    fn default() -> Self {
        Self {
            danger_below: 0.75,
            caution_below: 0.85,
            acceptable_below: 0.90,
            optimal_max: 0.93,
        }
    }
}

/// Clinical guideline limits. The defaults are the current recommendations;
/// a JSON file only needs the fields it overrides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuidelineThresholds {
    /// Prescribed dose below this (mL/kg/hr) warns
    pub effluent_dose_min: f64,
    /// Prescribed dose above this (mL/kg/hr) warns
    pub effluent_dose_max: f64,
    /// Upper bound of the dose band shown in the recommended-range summary
    pub effluent_dose_display_max: f64,
    /// Filtration fraction above this (%) is an error
    pub filtration_fraction_max: f64,
    /// Actual delivered dose below this (mL/kg/hr) warns
    pub delivered_dose_min: f64,
    /// mL/min
    pub blood_flow_min: f64,
    /// mL/min
    pub blood_flow_max: f64,
    pub dilution: DilutionCutoffs,
}

impl Default for GuidelineThresholds {
    fn default() -> Self {
        Self {
            effluent_dose_min: 25.0,
            effluent_dose_max: 30.0,
            effluent_dose_display_max: 35.0,
            filtration_fraction_max: 25.0,
            delivered_dose_min: 20.0,
            blood_flow_min: 100.0,
            blood_flow_max: 200.0,
            dilution: DilutionCutoffs::default(),
        }
    }
}

impl GuidelineThresholds {
    /// Parse and validate thresholds from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let thresholds: Self = serde_json::from_str(json)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Load thresholds from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let thresholds = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), "Loaded guideline thresholds");
        Ok(thresholds)
    }

    /// Check that every limit is usable and the bands are ordered.
    pub fn validate(&self) -> ConfigResult<()> {
        let named = [
            ("effluent_dose_min", self.effluent_dose_min),
            ("effluent_dose_max", self.effluent_dose_max),
            ("effluent_dose_display_max", self.effluent_dose_display_max),
            ("filtration_fraction_max", self.filtration_fraction_max),
            ("delivered_dose_min", self.delivered_dose_min),
            ("blood_flow_min", self.blood_flow_min),
            ("blood_flow_max", self.blood_flow_max),
            ("dilution.danger_below", self.dilution.danger_below),
            ("dilution.caution_below", self.dilution.caution_below),
            ("dilution.acceptable_below", self.dilution.acceptable_below),
            ("dilution.optimal_max", self.dilution.optimal_max),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: name.to_string(),
                    value,
                });
            }
        }

        if self.effluent_dose_min > self.effluent_dose_max {
            return Err(ConfigError::Unordered(
                "effluent_dose_min must not exceed effluent_dose_max".into(),
            ));
        }
        if self.blood_flow_min > self.blood_flow_max {
            return Err(ConfigError::Unordered(
                "blood_flow_min must not exceed blood_flow_max".into(),
            ));
        }
        let d = &self.dilution;
        if !(d.danger_below <= d.caution_below
            && d.caution_below <= d.acceptable_below
            && d.acceptable_below <= d.optimal_max)
        {
            return Err(ConfigError::Unordered(
                "dilution cut-offs must be ascending".into(),
            ));
        }
        Ok(())
    }
}
