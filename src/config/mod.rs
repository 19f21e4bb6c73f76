//! Configuration loading and merging
//!
//! Precedence: CLI flags > config file > defaults.

pub mod loader;
pub mod merge;

pub use loader::load_config;
pub use merge::{merge_cli_with_config, CliOverrides};
