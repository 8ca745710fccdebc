//! Configuration for the `forge` command: `forge.toml` discovery, parsing
//! and command-line overrides.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, find_config_from, load_config, merge_cli_overrides,
    resolve_path, CliOverrides, ConfigError, CONFIG_FILE,
};
pub use schema::*;
