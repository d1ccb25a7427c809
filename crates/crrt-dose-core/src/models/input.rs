//! Calculation input models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adapter::FieldId;

/// Patient parameters entered at the bedside.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInput {
    /// Body weight in kg
    pub weight: f64,
    /// Hematocrit in %
    pub hematocrit: f64,
}

/// Machine prescription parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionInput {
    /// Blood flow rate in mL/min
    pub blood_flow_rate: f64,
    /// Pre-filter replacement fluid in mL/hr
    pub pre_dilution: f64,
    /// Post-filter replacement fluid in mL/hr
    pub post_dilution: f64,
    /// Dialysate in mL/hr
    pub dialysate: f64,
    /// Net ultrafiltration in mL/hr
    pub ultra_filtration: f64,
    /// Prescribed therapy time in hr
    pub prescribed_time: f64,
    /// Time the circuit actually ran in hr
    pub actual_runtime: f64,
}

/// Everything the engine needs for one calculation.
///
/// Missing fields deserialize to 0, matching an empty form field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CalculationInput {
    #[serde(flatten)]
    pub patient: PatientInput,
    #[serde(flatten)]
    pub prescription: PrescriptionInput,
}

impl CalculationInput {
    /// Read a single field.
    pub fn get(&self, field: FieldId) -> f64 {
        match field {
            FieldId::Weight => self.patient.weight,
            FieldId::Hematocrit => self.patient.hematocrit,
            FieldId::BloodFlowRate => self.prescription.blood_flow_rate,
            FieldId::PreDilution => self.prescription.pre_dilution,
            FieldId::PostDilution => self.prescription.post_dilution,
            FieldId::Dialysate => self.prescription.dialysate,
            FieldId::UltraFiltration => self.prescription.ultra_filtration,
            FieldId::PrescribedTime => self.prescription.prescribed_time,
            FieldId::ActualRuntime => self.prescription.actual_runtime,
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, field: FieldId, value: f64) {
        let slot = match field {
            FieldId::Weight => &mut self.patient.weight,
            FieldId::Hematocrit => &mut self.patient.hematocrit,
            FieldId::BloodFlowRate => &mut self.prescription.blood_flow_rate,
            FieldId::PreDilution => &mut self.prescription.pre_dilution,
            FieldId::PostDilution => &mut self.prescription.post_dilution,
            FieldId::Dialysate => &mut self.prescription.dialysate,
            FieldId::UltraFiltration => &mut self.prescription.ultra_filtration,
            FieldId::PrescribedTime => &mut self.prescription.prescribed_time,
            FieldId::ActualRuntime => &mut self.prescription.actual_runtime,
        };
        *slot = value;
    }

    /// Copy with every negative or non-finite field replaced by 0.
    pub fn sanitized(&self) -> Self {
        let mut clean = *self;
        for field in FieldId::ALL {
            clean.set(field, sanitize_value(self.get(field)));
        }
        clean
    }

    /// Field-name → value map used by persisted snapshots.
    pub fn to_field_map(&self) -> BTreeMap<String, f64> {
        FieldId::ALL
            .iter()
            .map(|&f| (f.key().to_string(), self.get(f)))
            .collect()
    }

    /// Rebuild an input from a snapshot field map. Unknown keys are ignored,
    /// missing keys stay 0.
    pub fn from_field_map(map: &BTreeMap<String, f64>) -> Self {
        let mut input = Self::default();
        for (key, value) in map {
            if let Some(field) = FieldId::from_key(key) {
                input.set(field, *value);
            }
        }
        input.sanitized()
    }
}

/// Clamp a raw value into something safe to feed the formulas.
pub fn sanitize_value(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_negative_and_nan() {
        let mut input = CalculationInput::default();
        input.patient.weight = -5.0;
        input.patient.hematocrit = f64::NAN;
        input.prescription.blood_flow_rate = f64::INFINITY;
        input.prescription.dialysate = 1200.0;

        let clean = input.sanitized();
        assert_eq!(clean.patient.weight, 0.0);
        assert_eq!(clean.patient.hematocrit, 0.0);
        assert_eq!(clean.prescription.blood_flow_rate, 0.0);
        assert_eq!(clean.prescription.dialysate, 1200.0);
    }

    #[test]
    fn test_field_map_roundtrip_keys() {
        let mut input = CalculationInput::default();
        input.patient.weight = 64.5;
        input.prescription.blood_flow_rate = 120.0;

        let map = input.to_field_map();
        assert_eq!(map.len(), 9);
        assert_eq!(map["weight"], 64.5);
        assert_eq!(map["bloodFlowRate"], 120.0);

        assert_eq!(CalculationInput::from_field_map(&map), input);
    }

    #[test]
    fn test_from_field_map_ignores_unknown() {
        let mut map = BTreeMap::new();
        map.insert("weight".to_string(), 70.0);
        map.insert("favouriteColour".to_string(), 3.0);

        let input = CalculationInput::from_field_map(&map);
        assert_eq!(input.patient.weight, 70.0);
        assert_eq!(input.prescription.prescribed_time, 0.0);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let input: CalculationInput =
            serde_json::from_str(r#"{"weight": 80, "bloodFlowRate": 140}"#).unwrap();
        assert_eq!(input.patient.weight, 80.0);
        assert_eq!(input.prescription.blood_flow_rate, 140.0);
        assert_eq!(input.prescription.dialysate, 0.0);
    }
}
