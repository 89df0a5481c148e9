//! Entry points for loading [`EngineConfig`].

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::EngineConfig;
use crate::error::ConfigurationError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads engine configuration from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Later sources override earlier ones: defaults, global file,
    /// `config/config.toml`, `config/{TRELLIS_ENV}.toml`, `TRELLIS__*`
    /// environment variables.
    pub fn load(workspace_root: &Path) -> Result<EngineConfig, ConfigurationError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            parameters = config.parameters.len(),
            deactivated_conditions = config.conditions.deactivate.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigurationError> {
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<EngineConfig, ConfigurationError> {
        Ok(merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()?)
    }

    /// Location of the global configuration file
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
