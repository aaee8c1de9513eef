//! Native JSON estimators.
//!
//! Gradient boosted trees and linear models exported by the training
//! pipeline as plain JSON, evaluated without any external runtime.

use crate::models::regressor::Regressor;
use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Serialized estimator, tagged by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeModel {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
}

/// Sum of regression trees on top of a base score
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// Single regression tree, root at index 0
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Go to `left` when `x[feature] < threshold`, otherwise to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

/// `intercept + coefficients · x`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Tree {
    /// Children must come after their parent so every walk terminates
    fn validate(&self, n_features: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");

        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(
                        feature < n_features,
                        "node {idx} splits on feature {feature}, model has {n_features}"
                    );
                    ensure!(threshold.is_finite(), "node {idx} has a non-finite threshold");
                    for child in [left, right] {
                        ensure!(
                            child > idx && child < self.nodes.len(),
                            "node {idx} points to invalid child {child}"
                        );
                    }
                }
                Node::Leaf { leaf } => {
                    ensure!(leaf.is_finite(), "leaf {idx} has a non-finite value");
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { leaf } => return leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] < threshold { left } else { right };
                }
            }
        }
    }
}

impl NativeModel {
    /// Parse and validate a model from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let model: NativeModel =
            serde_json::from_str(json).context("Failed to parse native model")?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        match self {
            NativeModel::TreeEnsemble(ensemble) => {
                ensure!(ensemble.n_features > 0, "tree ensemble declares zero features");
                ensure!(!ensemble.trees.is_empty(), "tree ensemble has no trees");
                ensure!(ensemble.base_score.is_finite(), "non-finite base score");
                for (i, tree) in ensemble.trees.iter().enumerate() {
                    tree.validate(ensemble.n_features)
                        .with_context(|| format!("invalid tree {i}"))?;
                }
            }
            NativeModel::Linear(linear) => {
                ensure!(!linear.coefficients.is_empty(), "linear model has no coefficients");
                ensure!(
                    linear.intercept.is_finite() && linear.coefficients.iter().all(|c| c.is_finite()),
                    "linear model has non-finite parameters"
                );
            }
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        match self {
            NativeModel::TreeEnsemble(ensemble) => ensemble.n_features,
            NativeModel::Linear(linear) => linear.coefficients.len(),
        }
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        match self {
            NativeModel::TreeEnsemble(ensemble) => {
                ensemble.base_score
                    + ensemble
                        .trees
                        .iter()
                        .map(|tree| tree.evaluate(features))
                        .sum::<f64>()
            }
            NativeModel::Linear(linear) => {
                linear.intercept
                    + linear
                        .coefficients
                        .iter()
                        .zip(features)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
        }
    }
}

/// A native model bound to the artifact it came from
#[derive(Debug)]
pub struct NativeRegressor {
    name: String,
    model: NativeModel,
}

impl NativeRegressor {
    pub fn new(name: impl Into<String>, model: NativeModel) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }

    /// Read and validate a `.json` artifact
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let model = NativeModel::from_json(&json)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;
        Ok(Self::new(name, model))
    }
}

impl Regressor for NativeRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<usize> {
        Some(self.model.n_features())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let expected = self.model.n_features();
        if features.len() != expected {
            bail!(
                "{} expects {} features, got {}",
                self.name,
                expected,
                features.len()
            );
        }
        Ok(self.model.evaluate(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUMP_JSON: &str = r#"{
        "kind": "tree_ensemble",
        "n_features": 2,
        "base_score": 0.5,
        "trees": [
            {"nodes": [
                {"feature": 0, "threshold": 10.0, "left": 1, "right": 2},
                {"leaf": 1.0},
                {"leaf": 2.0}
            ]},
            {"nodes": [
                {"feature": 1, "threshold": 0.45, "left": 1, "right": 2},
                {"leaf": 0.25},
                {"leaf": -0.25}
            ]}
        ]
    }"#;

    #[test]
    fn test_tree_ensemble_prediction() {
        let model = NativeModel::from_json(STUMP_JSON).unwrap();
        let regressor = NativeRegressor::new("stump", model);

        assert_eq!(regressor.expected_features(), Some(2));
        assert_eq!(regressor.predict(&[5.0, 0.4]).unwrap(), 0.5 + 1.0 + 0.25);
        assert_eq!(regressor.predict(&[12.0, 0.5]).unwrap(), 0.5 + 2.0 - 0.25);
    }

    #[test]
    fn test_linear_prediction() {
        let model =
            NativeModel::from_json(r#"{"kind": "linear", "intercept": 1.0, "coefficients": [2.0, -1.0]}"#)
                .unwrap();
        let regressor = NativeRegressor::new("linear", model);

        assert_eq!(regressor.predict(&[3.0, 4.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let model = NativeModel::from_json(STUMP_JSON).unwrap();
        let regressor = NativeRegressor::new("stump", model);

        assert!(regressor.predict(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_backward_child_rejected() {
        let json = r#"{
            "kind": "tree_ensemble",
            "n_features": 1,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"leaf": 1.0}
            ]}]
        }"#;
        let err = NativeModel::from_json(json).unwrap_err();
        assert!(format!("{err:#}").contains("invalid child 0"));
    }

    #[test]
    fn test_feature_out_of_range_rejected() {
        let json = r#"{
            "kind": "tree_ensemble",
            "n_features": 1,
            "trees": [{"nodes": [
                {"feature": 3, "threshold": 1.0, "left": 1, "right": 2},
                {"leaf": 1.0},
                {"leaf": 2.0}
            ]}]
        }"#;
        assert!(NativeModel::from_json(json).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(NativeModel::from_json(r#"{"kind": "svm", "support": []}"#).is_err());
        assert!(NativeModel::from_json("not json").is_err());
    }
}
