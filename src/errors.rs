// src/errors.rs

//! Crate-wide error types.
//!
//! - [`CommandError`] describes why a single command failed. It only ever
//!   travels as text inside `cmd_finished` events.
//! - [`RunError`] is the aggregate outcome of one `Runner::run` call.
//! - [`ParallelExecError`] covers everything the CLI front-end can hit.

use std::process::ExitStatus;

use thiserror::Error;

/// Failure of a single command, rendered into the `err` event field.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("command could not start: {cmd}: {source}")]
    Start {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command had error: {cmd}: {status}")]
    Exit { cmd: String, status: ExitStatus },

    #[error("command had error: {cmd}: {source}")]
    Wait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command had error on kill: {cmd}: {source}")]
    Kill {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregate outcome of a run. Individual failure details live in the event
/// stream, never here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    #[error("command failed")]
    CommandFailed,

    #[error("interrupted")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum ParallelExecError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not parse command line {line:?}: {source}")]
    CommandLine {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error(transparent)]
    Run(#[from] RunError),
}

pub type Result<T> = std::result::Result<T, ParallelExecError>;
