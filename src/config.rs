//! Runtime configuration for the command-line front end.
//!
//! Templates are built in; extra ones can be loaded from a directory of JSON
//! files (each holding one template or an array of them). The parsing engine
//! itself never reads the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::model::ModelConfig;
use crate::registry::ModelRegistry;

/// Environment variable naming a directory of extra template files.
pub const MODELS_DIR_VAR: &str = "PLP_MODELS_DIR";
/// Environment variable controlling whether built-in templates are loaded.
pub const INCLUDE_BUILTIN_VAR: &str = "PLP_INCLUDE_BUILTIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub models_dir: Option<PathBuf>,
    pub include_builtin: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: None,
            include_builtin: true,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let models_dir = lookup(MODELS_DIR_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let include_builtin = match lookup(INCLUDE_BUILTIN_VAR) {
            None => true,
            Some(v) => parse_bool(&v)
                .with_context(|| format!("Invalid {}: {:?}", INCLUDE_BUILTIN_VAR, v))?,
        };

        Ok(Self {
            models_dir,
            include_builtin,
        })
    }

    /// Compile the registry these settings describe: built-ins first, then directory files.
    pub fn build_registry(&self) -> Result<ModelRegistry> {
        let mut configs = Vec::new();
        if self.include_builtin {
            configs.extend(ModelRegistry::builtin_configs()?);
        }
        if let Some(dir) = &self.models_dir {
            configs.extend(load_model_configs(dir)?);
        }
        if configs.is_empty() {
            anyhow::bail!("No models configured");
        }
        Ok(ModelRegistry::from_configs(&configs)?)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {:?}", other),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelFile {
    Many(Vec<ModelConfig>),
    One(Box<ModelConfig>),
}

/// Load every `*.json` template file in `dir`, in file name order.
pub fn load_model_configs(dir: &Path) -> Result<Vec<ModelConfig>> {
    if !dir.is_dir() {
        anyhow::bail!("Model directory does not exist: {:?}", dir);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let path = entry?.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut configs = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model config: {:?}", path))?;
        let file: ModelFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model config: {:?}", path))?;
        match file {
            ModelFile::Many(many) => configs.extend(many),
            ModelFile::One(one) => configs.push(*one),
        }
        info!("Loaded model config from {:?}", path);
    }

    Ok(configs)
}
