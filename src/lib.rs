//! Concrete Property Predictor Library
//!
//! Predicts split-tensile strength, compressive strength or slump of
//! fiber-reinforced concrete from its mix design, using one pre-trained
//! regressor per property.

pub mod config;
pub mod error;
pub mod feature_schema;
pub mod metrics;
pub mod models;
pub mod requests;
pub mod types;

pub use config::AppConfig;
pub use error::{FailureKind, PredictionError};
pub use feature_schema::{Feature, FeatureSchema, FeatureVector};
pub use metrics::PredictionMetrics;
pub use models::{ModelRegistry, PredictionDispatcher, Regressor};
pub use requests::serve_lines;
pub use types::{MixDesign, PredictionReport, PredictionRequest, TargetProperty};
