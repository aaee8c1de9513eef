//! Type definitions for the concrete property predictor

pub mod inputs;
pub mod property;
pub mod report;

pub use inputs::{MixDesign, PredictionRequest};
pub use property::TargetProperty;
pub use report::{PredictionReport, ReportOutcome};
