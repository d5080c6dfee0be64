// src/config/input.rs

//! Line-delimited command input.
//!
//! Each non-blank line is one command, split into words with shell quoting
//! rules (`"..."`, `'...'`, backslash escapes, `#` comments). Nothing is
//! expanded and no shell is involved.

use std::io::BufRead;

use tracing::debug;

use crate::errors::{ParallelExecError, Result};
use crate::exec::Command;

/// Split one command line into words.
pub fn tokenize_line(line: &str) -> Result<Vec<String>> {
    shell_words::split(line).map_err(|source| ParallelExecError::CommandLine {
        line: line.to_string(),
        source,
    })
}

/// Read commands, one per line. Lines that yield no words are skipped.
pub fn read_commands(reader: impl BufRead) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match Command::from_argv(tokenize_line(&line)?) {
            Some(command) => commands.push(command),
            None => debug!(line = %line, "skipping line without words"),
        }
    }

    Ok(commands)
}
