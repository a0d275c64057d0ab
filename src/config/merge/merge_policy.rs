//! Built-in defaults every configuration starts from.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("repository.id", "aip")?
        .set_default("repository.name", "Archival package store")?
        .set_default("repository.cmis_version", "1.1")?
        .set_default("repository.read_group", "cmis")?
        .set_default("index.warm_on_open", true)?
        .set_default("query.strategy", "indexed")
}
