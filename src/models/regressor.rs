//! Inference capability shared by every model artifact

use anyhow::Result;

/// A fitted regression estimator: one ordered feature vector in, one scalar out.
///
/// Implementations must not change observable state between calls, so the
/// same vector always yields the same prediction.
pub trait Regressor: Send + Sync {
    /// Short name used in logs (usually the artifact file name)
    fn name(&self) -> &str;

    /// Number of input columns the estimator declares, if the format records it
    fn expected_features(&self) -> Option<usize> {
        None
    }

    /// Run inference on a single feature vector
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

impl std::fmt::Debug for dyn Regressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regressor")
            .field("name", &self.name())
            .field("expected_features", &self.expected_features())
            .finish()
    }
}
