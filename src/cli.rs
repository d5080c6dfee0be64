// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `parallel-exec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parallel-exec",
    version,
    about = "Run commands in parallel with a bounded number of processes.",
    long_about = "Run commands in parallel with a bounded number of processes.\n\n\
                  Commands are read from stdin, one per line, unless --config is given."
)]
pub struct CliArgs {
    /// Fail on the first command failure, killing everything still running.
    #[arg(long)]
    pub fast_fail: bool,

    /// Maximum number of processes to run concurrently, or unlimited if 0.
    ///
    /// Default: `[runner].max_concurrent` from the config file, else the
    /// number of CPUs.
    #[arg(long, value_name = "N")]
    pub max_concurrent_cmds: Option<usize>,

    /// Read commands from a TOML config file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PARALLEL_EXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse and print the commands, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
