//! Caller-facing prediction reports

use crate::error::{FailureKind, PredictionError};
use crate::types::property::TargetProperty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Raw model output, unrounded
    Success { value: f64 },
    Failure { kind: FailureKind, error: String },
}

/// Prediction result rendered for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Unique report identifier
    pub report_id: String,

    /// Requested property; absent when the request itself could not be read
    pub property: Option<TargetProperty>,

    #[serde(flatten)]
    pub outcome: ReportOutcome,

    /// Message suitable for showing to the user
    pub message: String,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    /// Build a report from a dispatch result
    pub fn from_result(
        property: TargetProperty,
        result: &Result<f64, PredictionError>,
        decimals: usize,
    ) -> Self {
        let (outcome, message) = match result {
            Ok(value) => (
                ReportOutcome::Success { value: *value },
                format!("Predicted {}: {:.*}", property, decimals, value),
            ),
            Err(e) => (
                ReportOutcome::Failure {
                    kind: e.kind(),
                    error: e.to_string(),
                },
                e.to_string(),
            ),
        };

        Self::new(Some(property), outcome, message)
    }

    /// Report for a request that could not be parsed
    pub fn malformed_request(error: impl std::fmt::Display) -> Self {
        let message = format!("Malformed prediction request: {}", error);
        Self::new(
            None,
            ReportOutcome::Failure {
                kind: FailureKind::InvalidInput,
                error: message.clone(),
            },
            message,
        )
    }

    fn new(property: Option<TargetProperty>, outcome: ReportOutcome, message: String) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            property,
            outcome,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ReportOutcome::Success { .. })
    }

    /// Predicted value, only for successful reports
    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            ReportOutcome::Success { value } => Some(value),
            ReportOutcome::Failure { .. } => None,
        }
    }
}
