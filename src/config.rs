//! Configuration management for the concrete property predictor

use crate::types::property::TargetProperty;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "CONCRETE_PREDICTOR_CONFIG";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub models: ModelsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the model artifacts
    pub models_dir: String,
    /// Split-tensile strength artifact
    #[serde(default = "default_sts_model")]
    pub sts_model: String,
    /// Compressive strength artifact
    #[serde(default = "default_cs_model")]
    pub cs_model: String,
    /// Slump artifact
    #[serde(default = "default_slump_model")]
    pub slump_model: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_sts_model() -> String {
    "xgb_STS.onnx".to_string()
}

fn default_cs_model() -> String {
    "Catboost_CS.onnx".to_string()
}

fn default_slump_model() -> String {
    "CatBoost_Slump.onnx".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

impl ModelsConfig {
    /// Full path of the artifact serving a property
    pub fn model_path(&self, property: TargetProperty) -> PathBuf {
        let file = match property {
            TargetProperty::Sts => &self.sts_model,
            TargetProperty::Cs => &self.cs_model,
            TargetProperty::Slump => &self.slump_model,
        };
        Path::new(&self.models_dir).join(file)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            sts_model: default_sts_model(),
            cs_model: default_cs_model(),
            slump_model: default_slump_model(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Result presentation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Decimal places in prediction messages
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

fn default_decimals() -> usize {
    3
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Configured level, `None` when it names no tracing level
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.level.trim().parse().ok()
    }
}

impl AppConfig {
    /// Load configuration from `$CONCRETE_PREDICTOR_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
