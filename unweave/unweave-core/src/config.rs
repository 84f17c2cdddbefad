//! Engine configuration.
//!
//! Configuration is read from a TOML file (by default `unweave.toml` in the
//! working directory), then overridden from the environment and validated.
//!
//! ```toml
//! instrument_packages = ["github.com/datadog/orchestrion/instrument"]
//! prune_imports = true
//! validate_output = true
//! ```
//!
//! Environment overrides:
//! - `UNWEAVE_INSTRUMENT_PACKAGES`: comma-separated import paths
//! - `UNWEAVE_PRUNE_IMPORTS`: `true` or `false`

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, UninstrumentError};

/// Import path of the package the instrumentation pass calls into.
pub const DEFAULT_INSTRUMENT_PACKAGE: &str = "github.com/datadog/orchestrion/instrument";

/// File name looked up by [`EngineConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "unweave.toml";

pub const ENV_INSTRUMENT_PACKAGES: &str = "UNWEAVE_INSTRUMENT_PACKAGES";
pub const ENV_PRUNE_IMPORTS: &str = "UNWEAVE_PRUNE_IMPORTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Import paths whose identifiers the rules treat as instrumentation.
    pub instrument_packages: Vec<String>,
    /// Drop imports of these packages once nothing references them.
    pub prune_imports: bool,
    /// Re-parse the output and fail if it no longer parses.
    pub validate_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument_packages: vec![DEFAULT_INSTRUMENT_PACKAGE.to_string()],
            prune_imports: true,
            validate_output: true,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| UninstrumentError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result does not validate
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| UninstrumentError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded successfully from {}", path.display());
        Ok(config)
    }

    /// Load `unweave.toml` from `dir` when present, defaults otherwise.
    ///
    /// Environment overrides apply either way.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            return Self::load_from_path(&path);
        }

        debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
        let mut config = Self::default();
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| UninstrumentError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if no instrumentation package is configured or one of
    /// the paths is empty
    pub fn validate(&self) -> Result<()> {
        if self.instrument_packages.is_empty() {
            return Err(UninstrumentError::Config(
                "instrument_packages must name at least one import path".to_string(),
            ));
        }

        if let Some(pos) = self
            .instrument_packages
            .iter()
            .position(|p| p.trim().is_empty())
        {
            return Err(UninstrumentError::Config(format!(
                "instrument_packages[{}] is empty",
                pos
            )));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn merge_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        debug!("Merging environment variable overrides");

        if let Some(packages) = lookup(ENV_INSTRUMENT_PACKAGES) {
            debug!("Overriding instrument_packages from environment: {}", packages);
            self.instrument_packages = packages
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(prune) = lookup(ENV_PRUNE_IMPORTS) {
            debug!("Overriding prune_imports from environment: {}", prune);
            self.prune_imports = parse_bool(&prune).ok_or_else(|| {
                UninstrumentError::Config(format!(
                    "Invalid {} value '{}'. Must be true or false",
                    ENV_PRUNE_IMPORTS, prune
                ))
            })?;
        }

        Ok(())
    }

    /// Whether `path` is one of the configured instrumentation packages.
    pub fn is_instrument_package(&self, path: &str) -> bool {
        self.instrument_packages.iter().any(|p| p == path)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
