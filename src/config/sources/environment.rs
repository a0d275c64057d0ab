//! Environment variable source: AIPBRIDGE__ prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Add the environment overlay, e.g. `AIPBRIDGE__INDEX__WARM_ON_OPEN=false`.
/// User lists are comma-separated.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("AIPBRIDGE")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("users.read_only")
            .with_list_parse_key("users.read_write")
            .try_parsing(true),
    ))
}
