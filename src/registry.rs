//! Ordered, immutable set of compiled templates.
//!
//! Registry order is selection priority. Built-in templates ship as JSON under
//! `models/` and are embedded at compile time.

use std::collections::HashSet;

use tracing::info;

use crate::error::ModelError;
use crate::model::{ModelConfig, ModelDefinition};

/// Built-in template files, newest revision of each retailer first.
const BUILTIN_MODELS: &[(&str, &str)] = &[
    ("asda3.json", include_str!("../models/asda3.json")),
    ("bandm1.json", include_str!("../models/bandm1.json")),
    ("coop1.json", include_str!("../models/coop1.json")),
    ("sainsburys1.json", include_str!("../models/sainsburys1.json")),
    ("tesco2.json", include_str!("../models/tesco2.json")),
    ("tesco1.json", include_str!("../models/tesco1.json")),
];

/// Compiled templates in priority order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDefinition>,
}

impl ModelRegistry {
    /// Compile the built-in templates.
    pub fn builtin() -> Result<Self, ModelError> {
        Self::from_configs(&Self::builtin_configs()?)
    }

    /// Parse the embedded built-in template files.
    pub fn builtin_configs() -> Result<Vec<ModelConfig>, ModelError> {
        BUILTIN_MODELS
            .iter()
            .map(|(name, json)| {
                serde_json::from_str(json).map_err(|source| ModelError::Config {
                    name: name.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Compile configs in the given order, rejecting duplicates and bad patterns.
    pub fn from_configs(configs: &[ModelConfig]) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        let mut models = Vec::with_capacity(configs.len());

        for config in configs {
            let model = ModelDefinition::compile(config)?;
            if !seen.insert(model.id.to_uppercase()) {
                return Err(ModelError::DuplicateModel(model.id));
            }
            models.push(model);
        }

        let registry = Self { models };
        info!("Loaded {} models: {:?}", registry.len(), registry.list());
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    /// All templates, deprecated ones included, in priority order.
    pub fn models(&self) -> &[ModelDefinition] {
        &self.models
    }

    /// Templates eligible for selection.
    pub fn candidates(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.iter().filter(|m| !m.deprecated)
    }

    /// List all template ids.
    pub fn list(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
