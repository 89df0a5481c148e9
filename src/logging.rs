//! Logging System
//!
//! Structured logging through `tracing`. The subscriber is configured from
//! [`LoggingConfig`] with environment variable overrides.

use crate::error::ConfigurationError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path, used when output is "file"
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Colored output (text format on a terminal only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `trellis::store = "trace"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stdout".to_string()
}

/// `$XDG_DATA_HOME/trellis/trellis.log` or the platform equivalent
fn default_log_file() -> PathBuf {
    ProjectDirs::from("", "", "trellis")
        .map(|dirs| dirs.data_dir().join("trellis.log"))
        .unwrap_or_else(|| PathBuf::from(".trellis/trellis.log"))
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Every problem with this configuration, empty when valid
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !LEVELS.contains(&self.level.as_str()) {
            problems.push(format!(
                "invalid log level '{}' (must be one of {})",
                self.level,
                LEVELS.join(", ")
            ));
        }
        if let Err(e) = LogFormat::parse(&self.format) {
            problems.push(e.to_string());
        }
        if let Err(e) = LogOutput::parse(&self.output) {
            problems.push(e.to_string());
        }
        for (module, level) in &self.modules {
            if module.trim().is_empty() {
                problems.push("module name in log levels must not be empty".to_string());
            }
            if !LEVELS.contains(&level.as_str()) {
                problems.push(format!("invalid log level '{}' for module '{}'", level, module));
            }
        }
        problems
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        match raw {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigurationError::Invalid(format!(
                "invalid log format '{}' (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl LogOutput {
    fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        match raw {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(ConfigurationError::Invalid(format!(
                "invalid log output '{}' (must be 'stdout', 'stderr' or 'file')",
                other
            ))),
        }
    }
}

/// Initialize the global subscriber.
///
/// Priority order (highest to lowest):
/// 1. Environment variables (TRELLIS_LOG, TRELLIS_LOG_FORMAT, TRELLIS_LOG_OUTPUT, TRELLIS_LOG_MODULES)
/// 2. The given configuration
/// 3. Defaults
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigurationError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = build_env_filter(config)?;
    let format = match std::env::var("TRELLIS_LOG_FORMAT") {
        Ok(raw) => LogFormat::parse(raw.trim())?,
        Err(_) => LogFormat::parse(&config.format)?,
    };
    let output = match std::env::var("TRELLIS_LOG_OUTPUT") {
        Ok(raw) => LogOutput::parse(raw.trim())?,
        Err(_) => LogOutput::parse(&config.output)?,
    };

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(Arc::new(open_log_file(config)?)),
    };
    let ansi = config.color && output != LogOutput::File;

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| ConfigurationError::Invalid(format!("Failed to install logger: {}", e)))
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, ConfigurationError> {
    if let Some(parent) = config.file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigurationError::Invalid(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .map_err(|e| {
            ConfigurationError::Invalid(format!(
                "Failed to open log file {}: {}",
                config.file.display(),
                e
            ))
        })
}

/// Build the level filter; `TRELLIS_LOG` replaces the configured level and
/// module directives entirely
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigurationError> {
    if let Ok(filter) = EnvFilter::try_from_env("TRELLIS_LOG") {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = config
        .modules
        .iter()
        .map(|(module, level)| format!("{}={}", module, level))
        .collect();
    if let Ok(modules) = std::env::var("TRELLIS_LOG_MODULES") {
        directives.extend(parse_module_directives(&modules));
    }

    let mut filter = EnvFilter::new(&config.level);
    for directive in directives {
        filter = filter.add_directive(directive.parse().map_err(|e| {
            ConfigurationError::Invalid(format!("Invalid log directive '{}': {}", directive, e))
        })?);
    }
    Ok(filter)
}

/// `a=debug, b::c=trace` into directives; malformed entries are ignored
fn parse_module_directives(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then(|| format!("{}={}", module, level))
        })
        .collect()
}
