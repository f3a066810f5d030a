//! Parsing and validation of `bake.toml` orchestrator configuration files.
//!
//! This crate reads the optional project configuration file and produces a
//! strongly-typed [`BakeConfig`]. Every section has defaults, so a missing
//! file or an empty one yields the same configuration as
//! [`BakeConfig::default`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
