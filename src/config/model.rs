// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::{Command, OutputMode};

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [runner]
/// fast_fail = true
/// max_concurrent = 4
///
/// [[command]]
/// cmd = "cargo test --workspace"
///
/// [[command]]
/// cmd = "npm run lint"
/// cwd = "web"
/// stdout = "log"
/// ```
///
/// Both sections are optional at the TOML level; validation requires at
/// least one `[[command]]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default, rename = "command")]
    pub commands: Vec<CommandConfig>,
}

/// `[runner]` section. Unset values fall back to CLI flags or built-in
/// defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    pub fast_fail: Option<bool>,

    /// `0` means unlimited.
    pub max_concurrent: Option<usize>,
}

/// One `[[command]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Shell-style command line, tokenized with shell word rules. No shell
    /// is involved in running it.
    pub cmd: String,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub stdout: OutputMode,

    #[serde(default)]
    pub stderr: OutputMode,
}

/// Validated configuration: runner settings plus ready-to-run commands.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runner: RunnerSection,
    pub commands: Vec<Command>,
}
