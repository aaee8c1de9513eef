//! Classified prediction failures

use crate::types::property::TargetProperty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kind, without the details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ModelUnavailable,
    InvalidInput,
    InferenceFailure,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ModelUnavailable => "model_unavailable",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::InferenceFailure => "inference_failure",
        }
    }
}

/// Why a prediction request did not produce a value.
///
/// Every failure inside the dispatcher is converted into one of these
/// variants; none of them is retried within the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// The artifact for the property was missing or could not be loaded at startup
    #[error("Cannot predict {property}: model unavailable ({reason})")]
    ModelUnavailable {
        property: TargetProperty,
        reason: String,
    },

    /// A required named input is absent or not a usable number
    #[error("Cannot predict {property}: invalid input '{feature}' ({reason})")]
    InvalidInput {
        property: TargetProperty,
        feature: String,
        reason: String,
    },

    /// The model itself failed on a well-formed feature vector
    #[error("Prediction of {property} failed: {message}")]
    InferenceFailure {
        property: TargetProperty,
        message: String,
    },
}

impl PredictionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PredictionError::ModelUnavailable { .. } => FailureKind::ModelUnavailable,
            PredictionError::InvalidInput { .. } => FailureKind::InvalidInput,
            PredictionError::InferenceFailure { .. } => FailureKind::InferenceFailure,
        }
    }

    /// Property the failed request asked for
    pub fn property(&self) -> TargetProperty {
        match self {
            PredictionError::ModelUnavailable { property, .. }
            | PredictionError::InvalidInput { property, .. }
            | PredictionError::InferenceFailure { property, .. } => *property,
        }
    }

    /// Only bad inputs can be fixed by the caller; the other kinds need a restart
    /// with a working artifact or a different model.
    pub fn is_caller_correctable(&self) -> bool {
        matches!(self, PredictionError::InvalidInput { .. })
    }
}
