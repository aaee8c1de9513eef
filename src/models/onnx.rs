//! ONNX Runtime backed regressors

use crate::models::regressor::Regressor;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Regressor exported to ONNX (XGBoost / CatBoost regression graphs)
pub struct OnnxRegressor {
    name: String,
    /// Running a session needs exclusive access; the graph itself is never modified
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Column count from the graph's `[batch, n]` input, when fixed
    input_width: Option<usize>,
}

impl OnnxRegressor {
    /// Load a single ONNX model from file
    pub fn load(path: &Path, name: &str, threads: usize) -> Result<Self> {
        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let input_width = session
            .inputs
            .first()
            .and_then(|i| i.input_type.tensor_shape())
            .and_then(|shape| declared_width(shape));

        // Regression exports name their output "variable" (XGBoost) or "predictions" (CatBoost)
        let output_name = session
            .outputs
            .iter()
            .find(|o| {
                o.name.contains("variable") || o.name.contains("prediction") || o.name.contains("output")
            })
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        debug!(
            model = %name,
            input = %input_name,
            output = %output_name,
            input_width = ?input_width,
            "ONNX graph bound"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            input_width,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<usize> {
        self.input_width
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("{} produced no '{}' output", self.name, self.output_name))?;

        let (_, values) = output
            .try_extract_tensor::<f32>()
            .context("Model output is not an f32 tensor")?;

        let prediction = values
            .first()
            .copied()
            .with_context(|| format!("{} produced an empty output tensor", self.name))?;

        Ok(prediction as f64)
    }
}

/// Feature count of a `[batch, n]` input; symbolic (negative) or missing dims give `None`
fn declared_width(dims: &[i64]) -> Option<usize> {
    match dims {
        [_, n] if *n > 0 => Some(*n as usize),
        _ => None,
    }
}
