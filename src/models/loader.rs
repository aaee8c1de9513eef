//! Model artifact loader

use crate::feature_schema::FeatureSchema;
use crate::models::native::NativeRegressor;
use crate::models::registry::ModelSlot;
use crate::models::regressor::Regressor;
use crate::types::property::TargetProperty;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Loader for serialized regressors, dispatching on the file extension
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg(feature = "onnx")]
    onnx_threads: usize,
    #[cfg(feature = "onnx")]
    onnx_initialized: std::cell::Cell<bool>,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            #[cfg(feature = "onnx")]
            onnx_threads: onnx_threads.max(1),
            #[cfg(feature = "onnx")]
            onnx_initialized: std::cell::Cell::new(false),
        }
    }

    /// Load the artifact serving `property`, never failing.
    ///
    /// A missing, unreadable or malformed file, or one whose declared input
    /// width differs from the property's schema, is logged once and yields
    /// [`ModelSlot::Unavailable`] carrying the reason.
    pub fn load<P: AsRef<Path>>(&self, property: TargetProperty, path: P) -> ModelSlot {
        let path: PathBuf = path.as_ref().to_path_buf();
        let result = self
            .try_load(&path)
            .and_then(|model| check_width(property, model));

        match result {
            Ok(model) => {
                info!(property = %property, model = %model.name(), "Model ready");
                ModelSlot::Loaded { path, model }
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(
                    property = %property,
                    path = %path.display(),
                    error = %reason,
                    "Model unavailable"
                );
                ModelSlot::Unavailable { path, reason }
            }
        }
    }

    /// Deserialize an artifact, returning the reason on failure
    pub fn try_load<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Regressor>> {
        let path = path.as_ref();

        if !path.is_file() {
            bail!("Model file not found: {}", path.display());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let model: Box<dyn Regressor> = match extension.as_str() {
            "json" => Box::new(NativeRegressor::load(path, &name)?),
            "onnx" => self.load_onnx(path, &name)?,
            other => bail!(
                "Unsupported artifact format '{}' for {}",
                other,
                path.display()
            ),
        };

        info!(model = %name, path = %path.display(), "Model loaded successfully");
        Ok(model)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path, name: &str) -> Result<Box<dyn Regressor>> {
        if !self.onnx_initialized.get() {
            ort::init().commit()?;
            info!(onnx_threads = self.onnx_threads, "ONNX Runtime initialized");
            self.onnx_initialized.set(true);
        }
        let model = crate::models::onnx::OnnxRegressor::load(path, name, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path, _name: &str) -> Result<Box<dyn Regressor>> {
        bail!(
            "{} is an ONNX artifact but this build has no ONNX support (enable the `onnx` feature)",
            path.display()
        )
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject a model whose declared input width differs from the property's schema
pub(crate) fn check_width(property: TargetProperty, model: Box<dyn Regressor>) -> Result<Box<dyn Regressor>> {
    let schema = FeatureSchema::for_property(property);
    match model.expected_features() {
        Some(width) if width != schema.len() => bail!(
            "{} expects {} features but {} uses {}",
            model.name(),
            width,
            property,
            schema.len()
        ),
        _ => Ok(model),
    }
}
