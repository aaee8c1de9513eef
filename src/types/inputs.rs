//! Named mix-design inputs supplied by the caller

use crate::feature_schema::FeatureSchema;
use crate::types::property::TargetProperty;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Mapping of feature name to value, as collected by the input form.
///
/// Values are kept as raw JSON so that a non-numeric entry reaches the
/// dispatcher and is rejected there instead of being coerced on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MixDesign {
    values: HashMap<String, Value>,
}

impl MixDesign {
    /// Create an empty mix design
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix design holding the form's default (0.0) for every slot of the property's schema
    pub fn with_form_defaults(property: TargetProperty) -> Self {
        let mut mix = Self::new();
        for feature in FeatureSchema::for_property(property).features() {
            mix.set(feature.key(), 0.0);
        }
        mix
    }

    /// Set a numeric input.
    ///
    /// Non-finite numbers cannot be represented in JSON and are stored as `null`,
    /// which the dispatcher rejects as unusable.
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.values.insert(name.into(), value);
        self
    }

    /// Set a raw input value of any JSON type
    pub fn set_raw(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Builder-style [`MixDesign::set`]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Remove an input, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MixDesign {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut mix = Self::new();
        for (name, value) in iter {
            mix.set(name, value);
        }
        mix
    }
}

/// A single prediction request: which property, from which inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub property: TargetProperty,
    #[serde(default)]
    pub inputs: MixDesign,
}

impl PredictionRequest {
    pub fn new(property: TargetProperty, inputs: MixDesign) -> Self {
        Self { property, inputs }
    }
}
