// file: src/config/loader.rs
// version: 2.0.0
// guid: 5e364e9a-2de1-4c57-9f05-400d8d96cc96

//! Configuration file loading and environment variable substitution

use super::ProvisionConfig;
use crate::error::HardenError;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load a provisioning config, TOML or YAML chosen by extension
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ProvisionConfig> {
        let path = Self::expand_path(path.as_ref())?;
        let content = fs::read_to_string(&path).map_err(|e| {
            HardenError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let config: ProvisionConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&expanded)?,
            Some("toml") | None => toml::from_str(&expanded)?,
            Some(other) => {
                return Err(HardenError::config(format!(
                    "Unsupported config format: .{}",
                    other
                )))
            }
        };

        config.validate_config()?;
        debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(&self, path: Option<&Path>) -> Result<ProvisionConfig> {
        match path {
            Some(path) => self.load(path),
            None => Ok(ProvisionConfig::default()),
        }
    }

    /// Expand `~` and `$VAR` in a path given on the command line
    fn expand_path(path: &Path) -> Result<PathBuf> {
        let raw = path.to_string_lossy();
        let expanded = shellexpand::full(&raw)
            .map_err(|e| HardenError::config(format!("Cannot expand path {}: {}", raw, e)))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Expand `${VAR}` placeholders in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| HardenError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(HardenError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
