//! Feature schemas for the concrete property models.
//!
//! Each model was trained on a fixed column order. The order lives here, in
//! one table per target property, and vectors are only ever built from it.

use crate::error::PredictionError;
use crate::types::inputs::MixDesign;
use crate::types::property::TargetProperty;
use serde_json::Value;
use std::fmt;

/// One named numeric input of a mix design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Bnhf,
    Fiber,
    FiberLength,
    WaterCementRatio,
    Cement,
    FineAggregate,
    CoarseAggregate,
    Water,
    CuringTime,
}

impl Feature {
    /// Key the caller uses in the named-input mapping
    pub fn key(self) -> &'static str {
        match self {
            Feature::Bnhf => "BNHF",
            Feature::Fiber => "Fiber",
            Feature::FiberLength => "FiberLength",
            Feature::WaterCementRatio => "WC",
            Feature::Cement => "Cement",
            Feature::FineAggregate => "FineAgg",
            Feature::CoarseAggregate => "CoarseAgg",
            Feature::Water => "Water",
            Feature::CuringTime => "CuringTime",
        }
    }

    /// Schema slot name, unit included; accepted as an alternative key
    pub fn slot_name(self) -> &'static str {
        match self {
            Feature::Bnhf => "BNHF_pct",
            Feature::Fiber => "Fiber_kgm3",
            Feature::FiberLength => "FiberLength_mm",
            Feature::WaterCementRatio => "WC_ratio",
            Feature::Cement => "Cement_kgm3",
            Feature::FineAggregate => "FineAgg_kgm3",
            Feature::CoarseAggregate => "CoarseAgg_kgm3",
            Feature::Water => "Water_kgm3",
            Feature::CuringTime => "CuringTime_days",
        }
    }

    /// Label shown next to the input field
    pub fn label(self) -> &'static str {
        match self {
            Feature::Bnhf => "BNHF (%)",
            Feature::Fiber => "Fiber (kg/m3)",
            Feature::FiberLength => "Fiber Length (mm)",
            Feature::WaterCementRatio => "W/C",
            Feature::Cement => "Cement (kg/m3)",
            Feature::FineAggregate => "Fine Aggregate (kg/m3)",
            Feature::CoarseAggregate => "Coarse Aggregate (kg/m3)",
            Feature::Water => "Water (kg/m3)",
            Feature::CuringTime => "Curing Time (days)",
        }
    }

    /// Unit of the value, `None` for dimensionless ratios
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Feature::Bnhf => Some("%"),
            Feature::Fiber
            | Feature::Cement
            | Feature::FineAggregate
            | Feature::CoarseAggregate
            | Feature::Water => Some("kg/m3"),
            Feature::FiberLength => Some("mm"),
            Feature::WaterCementRatio => None,
            Feature::CuringTime => Some("days"),
        }
    }

    /// Raw value for this feature, by key first and slot name second
    fn lookup(self, inputs: &MixDesign) -> Option<&Value> {
        inputs
            .get(self.key())
            .or_else(|| inputs.get(self.slot_name()))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mix features shared by every model, in training order
const MIX_FEATURES: [Feature; 8] = [
    Feature::Bnhf,
    Feature::Fiber,
    Feature::FiberLength,
    Feature::WaterCementRatio,
    Feature::Cement,
    Feature::FineAggregate,
    Feature::CoarseAggregate,
    Feature::Water,
];

/// Strength models additionally take the curing age as the last column
const STRENGTH_FEATURES: [Feature; 9] = [
    Feature::Bnhf,
    Feature::Fiber,
    Feature::FiberLength,
    Feature::WaterCementRatio,
    Feature::Cement,
    Feature::FineAggregate,
    Feature::CoarseAggregate,
    Feature::Water,
    Feature::CuringTime,
];

/// Ordered list of features a property's model expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    property: TargetProperty,
    features: &'static [Feature],
}

impl FeatureSchema {
    /// Resolve the schema for a target property
    pub fn for_property(property: TargetProperty) -> Self {
        let features: &'static [Feature] = match property {
            TargetProperty::Sts | TargetProperty::Cs => &STRENGTH_FEATURES,
            TargetProperty::Slump => &MIX_FEATURES,
        };
        Self { property, features }
    }

    pub fn property(&self) -> TargetProperty {
        self.property
    }

    pub fn features(&self) -> &'static [Feature] {
        self.features
    }

    /// Number of columns the model expects
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Feature keys in column order
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.key()).collect()
    }

    /// Build the model input from named values, slot by slot in schema order.
    ///
    /// Keys outside the schema are ignored. A missing, non-numeric or
    /// non-finite value for any slot fails the whole assembly.
    pub fn assemble(&self, inputs: &MixDesign) -> Result<FeatureVector, PredictionError> {
        let mut values = Vec::with_capacity(self.features.len());

        for &feature in self.features {
            let raw = feature.lookup(inputs).ok_or_else(|| self.invalid(feature, "missing"))?;
            values.push(self.numeric(feature, raw)?);
        }

        Ok(FeatureVector {
            property: self.property,
            values,
        })
    }

    fn numeric(&self, feature: Feature, raw: &Value) -> Result<f64, PredictionError> {
        let value = match raw {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| self.invalid(feature, "number out of range"))?,
            Value::Null => return Err(self.invalid(feature, "null or non-finite value")),
            other => {
                return Err(self.invalid(
                    feature,
                    &format!("expected a number, got {}", json_type_name(other)),
                ))
            }
        };

        if !value.is_finite() {
            return Err(self.invalid(feature, "non-finite value"));
        }
        Ok(value)
    }

    fn invalid(&self, feature: Feature, reason: &str) -> PredictionError {
        PredictionError::InvalidInput {
            property: self.property,
            feature: feature.key().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Feature vector assembled from a schema; its length always equals the schema's
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    property: TargetProperty,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn property(&self) -> TargetProperty {
        self.property
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    fn full_mix() -> MixDesign {
        MixDesign::new()
            .with("BNHF", 5.0)
            .with("Fiber", 2.0)
            .with("FiberLength", 12.0)
            .with("WC", 0.4)
            .with("Cement", 350.0)
            .with("FineAgg", 650.0)
            .with("CoarseAgg", 1100.0)
            .with("Water", 150.0)
            .with("CuringTime", 28.0)
    }

    #[test]
    fn test_schema_lengths() {
        assert_eq!(FeatureSchema::for_property(TargetProperty::Sts).len(), 9);
        assert_eq!(FeatureSchema::for_property(TargetProperty::Cs).len(), 9);

        let slump = FeatureSchema::for_property(TargetProperty::Slump);
        assert_eq!(slump.len(), 8);
        assert!(!slump.contains(Feature::CuringTime));
    }

    #[test]
    fn test_strength_vector_order() {
        let vector = FeatureSchema::for_property(TargetProperty::Sts)
            .assemble(&full_mix())
            .unwrap();

        assert_eq!(
            vector.as_slice(),
            &[5.0, 2.0, 12.0, 0.4, 350.0, 650.0, 1100.0, 150.0, 28.0]
        );
        assert_eq!(vector.property(), TargetProperty::Sts);
    }

    #[test]
    fn test_slump_vector_excludes_curing_time() {
        let mut mix = full_mix();
        mix.remove("CuringTime");

        let vector = FeatureSchema::for_property(TargetProperty::Slump)
            .assemble(&mix)
            .unwrap();

        assert_eq!(
            vector.as_slice(),
            &[5.0, 2.0, 12.0, 0.4, 350.0, 650.0, 1100.0, 150.0]
        );
    }

    #[test]
    fn test_slump_ignores_supplied_curing_time() {
        let vector = FeatureSchema::for_property(TargetProperty::Slump)
            .assemble(&full_mix())
            .unwrap();
        assert_eq!(vector.len(), 8);
    }

    #[test]
    fn test_missing_input_is_invalid() {
        let mut mix = full_mix();
        mix.remove("CuringTime");

        let err = FeatureSchema::for_property(TargetProperty::Cs)
            .assemble(&mix)
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
        match err {
            PredictionError::InvalidInput { feature, reason, .. } => {
                assert_eq!(feature, "CuringTime");
                assert_eq!(reason, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_input_is_invalid() {
        let mut mix = full_mix();
        mix.set_raw("Cement", json!("350"));

        let err = FeatureSchema::for_property(TargetProperty::Sts)
            .assemble(&mix)
            .unwrap_err();
        assert!(err.to_string().contains("expected a number, got string"));

        let mut mix = full_mix();
        mix.set("Water", f64::INFINITY);
        let err = FeatureSchema::for_property(TargetProperty::Sts)
            .assemble(&mix)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }

    #[test]
    fn test_slot_names_accepted() {
        let mix = MixDesign::new()
            .with("BNHF_pct", 5.0)
            .with("Fiber_kgm3", 2.0)
            .with("FiberLength_mm", 12.0)
            .with("WC_ratio", 0.4)
            .with("Cement_kgm3", 350.0)
            .with("FineAgg_kgm3", 650.0)
            .with("CoarseAgg_kgm3", 1100.0)
            .with("Water_kgm3", 150.0);

        let vector = FeatureSchema::for_property(TargetProperty::Slump)
            .assemble(&mix)
            .unwrap();
        assert_eq!(vector.as_slice()[3], 0.4);
    }

    #[test]
    fn test_integer_inputs_accepted() {
        let mut mix = full_mix();
        mix.set_raw("Cement", json!(350));

        let vector = FeatureSchema::for_property(TargetProperty::Cs)
            .assemble(&mix)
            .unwrap();
        assert_eq!(vector.as_slice()[4], 350.0);
    }

    #[test]
    fn test_feature_names_and_labels() {
        let schema = FeatureSchema::for_property(TargetProperty::Sts);
        assert_eq!(schema.feature_names()[8], "CuringTime");
        assert_eq!(Feature::WaterCementRatio.label(), "W/C");
        assert_eq!(Feature::WaterCementRatio.unit(), None);
        assert_eq!(Feature::CuringTime.unit(), Some("days"));
    }
}
