// src/config/mod.rs

//! Where commands come from.
//!
//! - [`model`] and [`validate`]: the TOML config file (`[runner]` settings
//!   plus `[[command]]` entries) and its raw → validated conversion.
//! - [`loader`]: reading a config file from disk.
//! - [`input`]: line-delimited commands, e.g. piped on stdin.

pub mod input;
pub mod loader;
pub mod model;
pub mod validate;

pub use input::{read_commands, tokenize_line};
pub use loader::{load_and_validate, load_from_path};
pub use model::{CommandConfig, ConfigFile, RawConfigFile, RunnerSection};
