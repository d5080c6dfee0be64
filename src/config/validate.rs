// src/config/validate.rs

use crate::config::input::tokenize_line;
use crate::config::model::{CommandConfig, ConfigFile, RawConfigFile};
use crate::errors::{ParallelExecError, Result};
use crate::exec::Command;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ParallelExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_commands(&raw)?;

        let commands = raw
            .commands
            .iter()
            .enumerate()
            .map(|(index, entry)| build_command(index, entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile {
            runner: raw.runner,
            commands,
        })
    }
}

fn ensure_has_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.commands.is_empty() {
        return Err(ParallelExecError::ConfigError(
            "config must contain at least one [[command]] section".to_string(),
        ));
    }
    Ok(())
}

fn build_command(index: usize, entry: &CommandConfig) -> Result<Command> {
    let words = tokenize_line(&entry.cmd)?;
    let Some(mut command) = Command::from_argv(words) else {
        return Err(ParallelExecError::ConfigError(format!(
            "[[command]] #{index}: cmd is empty"
        )));
    };

    if let Some(dir) = &entry.cwd {
        command = command.current_dir(dir);
    }

    Ok(command.stdout(entry.stdout).stderr(entry.stderr))
}
