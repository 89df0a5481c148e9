//! Merge rules: defaults and override order.
//!
//! Later sources win: defaults, global file, workspace files, environment.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with engine defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.close_resources", true)?
        .set_default("conditions.deactivate", Vec::<String>::new())?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.color", true)
}
