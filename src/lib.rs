// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod runner;

use std::io;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, read_commands, RunnerSection};
use crate::errors::Result;
use crate::exec::Command;

pub use crate::errors::{CommandError, ParallelExecError, RunError};
pub use crate::events::{Event, EventKind, EventSink, LogEventSink};
pub use crate::exec::{ConcurrencyGate, OutputMode};
pub use crate::runner::{Runner, RunnerOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - command loading (config file or stdin)
/// - runner options (CLI flags over `[runner]` settings over defaults)
/// - the runner itself, with Ctrl-C as the interruption signal
pub async fn run(args: CliArgs) -> Result<()> {
    let (settings, commands) = match &args.config {
        Some(path) => {
            let cfg = load_and_validate(path)?;
            (cfg.runner, cfg.commands)
        }
        None => (RunnerSection::default(), read_commands(io::stdin().lock())?),
    };

    let options = runner_options(&args, settings);

    if args.dry_run {
        print_dry_run(&options, &commands);
        return Ok(());
    }

    info!(commands = commands.len(), "loaded commands");
    Runner::new(options).run(commands).await?;
    Ok(())
}

/// Merge CLI flags with config file settings. Flags win; `--fast-fail` can
/// only switch fast-fail on.
pub fn runner_options(args: &CliArgs, settings: RunnerSection) -> RunnerOptions {
    let max_concurrent = args
        .max_concurrent_cmds
        .or(settings.max_concurrent)
        .unwrap_or_else(runner::default_max_concurrent);

    RunnerOptions::default()
        .with_fast_fail(args.fast_fail || settings.fast_fail.unwrap_or(false))
        .with_max_concurrent(max_concurrent)
}

/// Simple dry-run output: print runner settings and commands.
fn print_dry_run(options: &RunnerOptions, commands: &[Command]) {
    println!("parallel-exec dry-run");
    println!("  fast_fail = {}", options.fast_fail);
    if options.max_concurrent == 0 {
        println!("  max_concurrent = unlimited");
    } else {
        println!("  max_concurrent = {}", options.max_concurrent);
    }
    println!();

    println!("commands ({}):", commands.len());
    for command in commands {
        println!("  - {}", command.description());
        if let Some(dir) = command.working_dir() {
            println!("      cwd: {}", dir.display());
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("parallel-exec").chain(extra.iter().copied()))
            .unwrap()
    }

    #[test]
    fn flags_override_config_settings() {
        let settings = RunnerSection {
            fast_fail: Some(false),
            max_concurrent: Some(8),
        };
        let options = runner_options(&args(&["--fast-fail", "--max-concurrent-cmds", "2"]), settings);
        assert!(options.fast_fail);
        assert_eq!(options.max_concurrent, 2);
    }

    #[test]
    fn config_settings_fill_in_missing_flags() {
        let settings = RunnerSection {
            fast_fail: Some(true),
            max_concurrent: Some(0),
        };
        let options = runner_options(&args(&[]), settings);
        assert!(options.fast_fail);
        assert_eq!(options.max_concurrent, 0);
    }

    #[test]
    fn host_parallelism_is_the_last_resort() {
        let options = runner_options(&args(&[]), RunnerSection::default());
        assert!(!options.fast_fail);
        assert_eq!(options.max_concurrent, runner::default_max_concurrent());
        assert!(options.max_concurrent >= 1);
    }
}
