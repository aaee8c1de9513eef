//! Prediction dispatch: request in, value or classified failure out

use crate::error::PredictionError;
use crate::feature_schema::FeatureSchema;
use crate::metrics::PredictionMetrics;
use crate::models::registry::ModelRegistry;
use crate::types::inputs::{MixDesign, PredictionRequest};
use crate::types::property::TargetProperty;
use crate::types::report::PredictionReport;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// Turns prediction requests into predictions using the models of a registry.
///
/// Holds no state of its own between requests; identical requests against
/// the same registry give identical results.
pub struct PredictionDispatcher<'a> {
    registry: &'a ModelRegistry,
    metrics: Option<&'a PredictionMetrics>,
    decimals: usize,
}

impl<'a> PredictionDispatcher<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self {
            registry,
            metrics: None,
            decimals: 3,
        }
    }

    /// Record every outcome in `metrics`
    pub fn with_metrics(mut self, metrics: &'a PredictionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decimal places used in report messages
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    /// Predict `property` from the named inputs
    pub fn predict(&self, property: TargetProperty, inputs: &MixDesign) -> Result<f64, PredictionError> {
        let start = Instant::now();
        let result = self.dispatch(property, inputs);
        let elapsed = start.elapsed();

        match &result {
            Ok(value) => debug!(
                property = %property,
                prediction = *value,
                latency_us = elapsed.as_micros() as u64,
                "Prediction complete"
            ),
            Err(e) => warn!(property = %property, kind = e.kind().as_str(), error = %e, "Prediction failed"),
        }

        if let Some(metrics) = self.metrics {
            metrics.record(property, &result, elapsed);
        }

        result
    }

    /// Convenience wrapper over [`PredictionDispatcher::predict`]
    pub fn predict_request(&self, request: &PredictionRequest) -> Result<f64, PredictionError> {
        self.predict(request.property, &request.inputs)
    }

    /// Predict and wrap the outcome for display
    pub fn report(&self, request: &PredictionRequest) -> PredictionReport {
        let result = self.predict_request(request);
        PredictionReport::from_result(request.property, &result, self.decimals)
    }

    fn dispatch(&self, property: TargetProperty, inputs: &MixDesign) -> Result<f64, PredictionError> {
        let schema = FeatureSchema::for_property(property);
        let features = schema.assemble(inputs)?;

        let model = self
            .registry
            .get(property)
            .ok_or_else(|| PredictionError::ModelUnavailable {
                property,
                reason: self
                    .registry
                    .unavailable_reason(property)
                    .unwrap_or("not loaded")
                    .to_string(),
            })?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.predict(features.as_slice())));

        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                return Err(PredictionError::InferenceFailure {
                    property,
                    message: format!("{e:#}"),
                })
            }
            Err(_) => {
                return Err(PredictionError::InferenceFailure {
                    property,
                    message: format!("{} panicked during inference", model.name()),
                })
            }
        };

        if !value.is_finite() {
            return Err(PredictionError::InferenceFailure {
                property,
                message: format!("{} returned a non-finite value ({})", model.name(), value),
            });
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::regressor::testing::{FailingRegressor, RecordingRegressor};
    use crate::models::regressor::Regressor;
    use crate::types::report::ReportOutcome;

    fn sample_mix() -> MixDesign {
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
    fn test_sts_receives_nine_features_in_order() {
        let (sts, calls) = RecordingRegressor::new("sts", 3.21);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Sts, sts)
            .build();
        let dispatcher = PredictionDispatcher::new(&registry);

        let value = dispatcher.predict(TargetProperty::Sts, &sample_mix()).unwrap();

        assert_eq!(value, 3.21);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![5.0, 2.0, 12.0, 0.4, 350.0, 650.0, 1100.0, 150.0, 28.0]
        );
    }

    #[test]
    fn test_cs_receives_nine_features() {
        let (cs, calls) = RecordingRegressor::new("cs", 42.0);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Cs, cs)
            .build();

        PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Cs, &sample_mix())
            .unwrap();

        assert_eq!(calls.lock().unwrap()[0].len(), 9);
    }

    #[test]
    fn test_slump_receives_eight_features() {
        let (slump, calls) = RecordingRegressor::new("slump", 85.0);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Slump, slump)
            .build();
        let mut mix = sample_mix();
        mix.remove("CuringTime");

        let value = PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Slump, &mix)
            .unwrap();

        assert_eq!(value, 85.0);
        assert_eq!(
            calls.lock().unwrap()[0],
            vec![5.0, 2.0, 12.0, 0.4, 350.0, 650.0, 1100.0, 150.0]
        );
    }

    #[test]
    fn test_unavailable_model_is_never_invoked() {
        for property in TargetProperty::ALL {
            // Register models for every other property only
            let mut builder = ModelRegistry::builder();
            let mut recorders = Vec::new();
            for other in TargetProperty::ALL.into_iter().filter(|&p| p != property) {
                let (model, calls) = RecordingRegressor::new("other", 1.0);
                builder = builder.with_model(other, model);
                recorders.push(calls);
            }
            let registry = builder.build();

            let err = PredictionDispatcher::new(&registry)
                .predict(property, &sample_mix())
                .unwrap_err();

            assert_eq!(err.kind(), FailureKind::ModelUnavailable);
            assert_eq!(err.property(), property);
            for calls in recorders {
                assert!(calls.lock().unwrap().is_empty());
            }
        }
    }

    #[test]
    fn test_missing_input_is_invalid_and_skips_inference() {
        let (cs, calls) = RecordingRegressor::new("cs", 42.0);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Cs, cs)
            .build();
        let mut mix = sample_mix();
        mix.remove("Water");

        let err = PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Cs, &mix)
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_each_omitted_input_names_its_slot() {
        for property in TargetProperty::ALL {
            let (model, calls) = RecordingRegressor::new("model", 1.0);
            let registry = ModelRegistry::builder().with_model(property, model).build();
            let dispatcher = PredictionDispatcher::new(&registry);
            let schema = FeatureSchema::for_property(property);

            for feature in schema.features() {
                let mut mix = sample_mix();
                mix.remove(feature.key());

                let err = dispatcher.predict(property, &mix).unwrap_err();
                match err {
                    PredictionError::InvalidInput {
                        property: failed,
                        feature: name,
                        reason,
                    } => {
                        assert_eq!(failed, property);
                        assert_eq!(name, feature.key());
                        assert_eq!(reason, "missing");
                    }
                    other => panic!("{property}: unexpected error {other:?}"),
                }
            }

            assert!(calls.lock().unwrap().is_empty(), "{property} model was invoked");
        }
    }

    #[test]
    fn test_inference_error_is_classified() {
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Sts, FailingRegressor)
            .build();

        let err = PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Sts, &sample_mix())
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InferenceFailure);
        assert!(err.to_string().contains("numerical error"));
    }

    struct NanRegressor;

    impl Regressor for NanRegressor {
        fn name(&self) -> &str {
            "nan"
        }

        fn predict(&self, _features: &[f64]) -> anyhow::Result<f64> {
            Ok(f64::NAN)
        }
    }

    struct PanickingRegressor;

    impl Regressor for PanickingRegressor {
        fn name(&self) -> &str {
            "panicking"
        }

        fn predict(&self, features: &[f64]) -> anyhow::Result<f64> {
            Ok(features[100])
        }
    }

    #[test]
    fn test_non_finite_output_is_a_failure() {
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Cs, NanRegressor)
            .build();

        let err = PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Cs, &sample_mix())
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InferenceFailure);
    }

    #[test]
    fn test_panicking_model_is_contained() {
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Slump, PanickingRegressor)
            .build();

        let err = PredictionDispatcher::new(&registry)
            .predict(TargetProperty::Slump, &sample_mix())
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InferenceFailure);
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn test_repeated_requests_are_identical() {
        let (sts, _) = RecordingRegressor::new("sts", 2.75);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Sts, sts)
            .build();
        let dispatcher = PredictionDispatcher::new(&registry);
        let mix = sample_mix();

        let first = dispatcher.predict(TargetProperty::Sts, &mix);
        let second = dispatcher.predict(TargetProperty::Sts, &mix);
        assert_eq!(first, second);

        let first = dispatcher.predict(TargetProperty::Cs, &mix);
        let second = dispatcher.predict(TargetProperty::Cs, &mix);
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_and_metrics() {
        let (sts, _) = RecordingRegressor::new("sts", 3.14159);
        let registry = ModelRegistry::builder()
            .with_model(TargetProperty::Sts, sts)
            .build();
        let metrics = PredictionMetrics::new();
        let dispatcher = PredictionDispatcher::new(&registry).with_metrics(&metrics);

        let ok = dispatcher.report(&PredictionRequest::new(TargetProperty::Sts, sample_mix()));
        assert_eq!(ok.message, "Predicted STS: 3.142");
        assert_eq!(ok.outcome, ReportOutcome::Success { value: 3.14159 });

        let failed = dispatcher.report(&PredictionRequest::new(TargetProperty::Slump, sample_mix()));
        assert!(failed.message.starts_with("Cannot predict Slump"));

        let summary = metrics.summary();
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures_by_kind.get(&FailureKind::ModelUnavailable), Some(&1));
    }
}
