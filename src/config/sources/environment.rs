//! Environment source: TRELLIS__SECTION__KEY, e.g. TRELLIS__STORE__CLOSE_RESOURCES=false

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("TRELLIS")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("conditions.deactivate"),
    )
}
