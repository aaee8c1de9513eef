//! Model artifacts: loading, registry and prediction dispatch

pub mod dispatcher;
pub mod loader;
pub mod native;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;
pub mod regressor;

pub use dispatcher::PredictionDispatcher;
pub use loader::ModelLoader;
pub use native::{NativeModel, NativeRegressor};
#[cfg(feature = "onnx")]
pub use onnx::OnnxRegressor;
pub use registry::{ModelRegistry, ModelSlot, ModelStatus};
pub use regressor::Regressor;
