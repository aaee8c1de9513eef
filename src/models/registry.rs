//! Registry of the three property models.
//!
//! Built once at startup and read-only afterwards. Each property owns an
//! independent slot, so a missing artifact only disables its own property.

use crate::config::ModelsConfig;
use crate::models::loader::{check_width, ModelLoader};
use crate::models::regressor::Regressor;
use crate::types::property::TargetProperty;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load result for one property
#[derive(Debug)]
pub enum ModelSlot {
    Loaded {
        path: PathBuf,
        model: Box<dyn Regressor>,
    },
    Unavailable {
        path: PathBuf,
        reason: String,
    },
}

impl ModelSlot {
    fn path(&self) -> &Path {
        match self {
            ModelSlot::Loaded { path, .. } | ModelSlot::Unavailable { path, .. } => path,
        }
    }
}

/// Caller-facing load status of a property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub property: TargetProperty,
    pub path: PathBuf,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Owns one model slot per target property
#[derive(Debug)]
pub struct ModelRegistry {
    slots: [ModelSlot; 3],
}

impl ModelRegistry {
    /// Load all three artifacts named by the configuration
    pub fn load(config: &ModelsConfig) -> Self {
        let loader = ModelLoader::with_threads(config.onnx_threads);
        Self::load_with(&loader, |property| config.model_path(property))
    }

    /// Load from explicit paths, in STS, CS, Slump order
    pub fn from_paths<P: AsRef<Path>>(sts: P, cs: P, slump: P) -> Self {
        let paths = [
            sts.as_ref().to_path_buf(),
            cs.as_ref().to_path_buf(),
            slump.as_ref().to_path_buf(),
        ];
        Self::load_with(&ModelLoader::new(), |property| paths[property.index()].clone())
    }

    fn load_with<F>(loader: &ModelLoader, path_for: F) -> Self
    where
        F: Fn(TargetProperty) -> PathBuf,
    {
        let slots = TargetProperty::ALL.map(|property| loader.load(property, path_for(property)));
        let registry = Self { slots };

        let available = registry.available_count();
        if available == 0 {
            warn!("No models loaded; every prediction request will be refused");
        } else {
            info!(
                available = available,
                total = TargetProperty::ALL.len(),
                "Model registry initialized"
            );
        }

        registry
    }

    /// Start an empty registry for injecting in-memory models
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Model serving a property, if it loaded
    pub fn get(&self, property: TargetProperty) -> Option<&dyn Regressor> {
        match &self.slots[property.index()] {
            ModelSlot::Loaded { model, .. } => Some(model.as_ref()),
            ModelSlot::Unavailable { .. } => None,
        }
    }

    pub fn slot(&self, property: TargetProperty) -> &ModelSlot {
        &self.slots[property.index()]
    }

    pub fn is_available(&self, property: TargetProperty) -> bool {
        matches!(self.slots[property.index()], ModelSlot::Loaded { .. })
    }

    /// Why a property's model is unavailable, `None` when it loaded
    pub fn unavailable_reason(&self, property: TargetProperty) -> Option<&str> {
        match &self.slots[property.index()] {
            ModelSlot::Unavailable { reason, .. } => Some(reason),
            ModelSlot::Loaded { .. } => None,
        }
    }

    pub fn available_count(&self) -> usize {
        TargetProperty::ALL
            .iter()
            .filter(|&&p| self.is_available(p))
            .count()
    }

    /// Load status of every property, in form order
    pub fn status(&self) -> Vec<ModelStatus> {
        TargetProperty::ALL
            .iter()
            .map(|&property| {
                let slot = self.slot(property);
                ModelStatus {
                    property,
                    path: slot.path().to_path_buf(),
                    available: self.is_available(property),
                    reason: self.unavailable_reason(property).map(str::to_string),
                }
            })
            .collect()
    }
}

/// Assembles a registry from in-memory models; properties left unset are unavailable
#[derive(Default)]
pub struct RegistryBuilder {
    models: [Option<Box<dyn Regressor>>; 3],
}

impl RegistryBuilder {
    pub fn with_model(mut self, property: TargetProperty, model: impl Regressor + 'static) -> Self {
        self.models[property.index()] = Some(Box::new(model));
        self
    }

    pub fn build(self) -> ModelRegistry {
        let mut models = self.models;
        let slots = TargetProperty::ALL.map(|property| {
            let path = PathBuf::from(format!("<memory:{}>", property));
            match models[property.index()].take() {
                Some(model) => match check_width(property, model) {
                    Ok(model) => ModelSlot::Loaded { path, model },
                    Err(e) => ModelSlot::Unavailable {
                        path,
                        reason: e.to_string(),
                    },
                },
                None => ModelSlot::Unavailable {
                    path,
                    reason: "no model registered".to_string(),
                },
            }
        });
        ModelRegistry { slots }
    }
}
