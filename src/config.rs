//! Configuration System
//!
//! Layered engine configuration: built-in defaults, a global user file, the
//! workspace's `config/` directory and `TRELLIS__*` environment variables.
//! Configuration parameters reach extensions through their context.

use crate::condition::evaluator::compile_pattern;
use crate::error::ConfigurationError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Free-form parameters readable by extensions
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    #[serde(default)]
    pub conditions: ConditionsConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Condition evaluation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionsConfig {
    /// Condition names to ignore; `*` matches any sequence of characters
    #[serde(default)]
    pub deactivate: Vec<String>,
}

/// Value store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Close registered resources when a context's store is torn down
    #[serde(default = "default_true")]
    pub close_resources: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            close_resources: true,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Parameter(String, String),
    Conditions(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Parameter(key, msg) => write!(f, "Parameter '{}': {}", key, msg),
            ValidationError::Conditions(msg) => write!(f, "Conditions: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl EngineConfig {
    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(raw)
            .map_err(|e| ConfigurationError::Invalid(format!("Failed to parse TOML: {}", e)))
    }

    /// Validate the entire configuration, reporting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for key in self.parameters.keys() {
            if key.trim().is_empty() {
                errors.push(ValidationError::Parameter(
                    key.clone(),
                    "key must not be empty".to_string(),
                ));
            }
        }

        for pattern in &self.conditions.deactivate {
            if let Err(e) = compile_pattern(pattern) {
                errors.push(ValidationError::Conditions(e.to_string()));
            }
        }

        errors.extend(
            self.logging
                .problems()
                .into_iter()
                .map(ValidationError::Logging),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into a single error
    pub fn ensure_valid(&self) -> Result<(), ConfigurationError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigurationError::Invalid(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }
}
