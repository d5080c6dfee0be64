// src/exec/command.rs

//! Immutable description of one external command.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command as ProcessCommand};
use tracing::info;

/// Where a command's stdout or stderr goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Share the parent's stream.
    #[default]
    Inherit,
    /// Discard the output.
    Null,
    /// Capture the output and forward each line through `tracing`.
    Log,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Null => Stdio::null(),
            OutputMode::Log => Stdio::piped(),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inherit" => Ok(OutputMode::Inherit),
            "null" => Ok(OutputMode::Null),
            "log" => Ok(OutputMode::Log),
            other => Err(format!(
                "invalid output mode: {other} (expected \"inherit\", \"null\" or \"log\")"
            )),
        }
    }
}

/// A fully resolved command: program, arguments and stream bindings.
///
/// Built once with the consuming builder methods, then handed to a
/// `ProcessController` which owns it for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    stdout: OutputMode,
    stderr: OutputMode,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stdout: OutputMode::default(),
            stderr: OutputMode::default(),
        }
    }

    /// Build a command from already tokenized words. `None` if `argv` is empty.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = argv.into_iter().map(Into::into);
        let program = words.next()?;
        Some(Self::new(program).args(words))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdout(mut self, mode: OutputMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: OutputMode) -> Self {
        self.stderr = mode;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Human-readable form used for the `cmd` event field.
    pub fn description(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Launch the process.
    ///
    /// Streams bound to [`OutputMode::Log`] are drained by background tasks
    /// so the child never stalls on a full pipe.
    pub(crate) fn spawn(&self) -> std::io::Result<Child> {
        let mut cmd = ProcessCommand::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(self.stdout.stdio())
            .stderr(self.stderr.stdio())
            .kill_on_drop(true);

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(self.description(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(self.description(), "stderr", stderr);
        }

        Ok(child)
    }
}

fn forward_lines<R>(cmd: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(cmd = %cmd, stream, "{}", line);
        }
    });
}
