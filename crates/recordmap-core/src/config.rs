//! Mapper configuration
//!
//! Settings are plain serde structs with defaults, so they can be built in
//! code or loaded from a JSON or YAML file:
//!
//! ```yaml
//! omit_null: true
//! max_depth: 64
//! max_construct_attempts: 16
//! strict_mode: warn
//! args_key: args
//! kwargs_key: kwargs
//! ```

use crate::error::{Error, Result, StrictMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default recursion limit for both directions
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default cap on constructor invocations per object
pub const DEFAULT_MAX_CONSTRUCT_ATTEMPTS: usize = 16;

/// Configuration shared by [`Flattener`](crate::Flattener) and
/// [`Rehydrator`](crate::Rehydrator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Drop object fields whose flattened value is null
    pub omit_null: bool,

    /// Maximum nesting depth before failing
    pub max_depth: usize,

    /// Maximum constructor invocations while relaxing keyword arguments
    pub max_construct_attempts: usize,

    /// How construction failures are surfaced
    pub strict_mode: StrictMode,

    /// Reserved record key feeding a variadic positional parameter
    pub args_key: String,

    /// Reserved record key feeding a variadic keyword parameter
    pub kwargs_key: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            omit_null: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_construct_attempts: DEFAULT_MAX_CONSTRUCT_ATTEMPTS,
            strict_mode: StrictMode::default(),
            args_key: "args".to_string(),
            kwargs_key: "kwargs".to_string(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let config: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| Error::Configuration {
                    message: format!("Failed to parse {}: {}", path.display(), e),
                    source: Some(e.into()),
                })?
            }
            _ => {
                return Err(Error::Configuration {
                    message: format!("Unsupported configuration format: {}", path.display()),
                    source: None,
                });
            }
        };

        config.validate()?;
        log::debug!("Loaded mapper configuration from {}", path.display());
        Ok(config)
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(invalid("max_depth must be at least 1"));
        }
        if self.max_construct_attempts == 0 {
            return Err(invalid("max_construct_attempts must be at least 1"));
        }
        if self.args_key.is_empty() || self.kwargs_key.is_empty() {
            return Err(invalid("reserved argument keys must not be empty"));
        }
        if self.args_key == self.kwargs_key {
            return Err(invalid("args_key and kwargs_key must differ"));
        }
        Ok(())
    }

    /// Keep null-valued fields when flattening
    pub fn keep_null(mut self) -> Self {
        self.omit_null = false;
        self
    }

    /// Set the strictness mode
    pub fn with_strict_mode(mut self, mode: StrictMode) -> Self {
        self.strict_mode = mode;
        self
    }

    /// Set the recursion limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

fn invalid(message: &str) -> Error {
    Error::Configuration {
        message: message.to_string(),
        source: None,
    }
}
