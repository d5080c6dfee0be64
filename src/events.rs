// src/events.rs

//! Lifecycle events emitted during a run, and the sinks that consume them.
//!
//! Every run produces exactly one `run_started` (first) and one
//! `run_finished` (last) event. In between, each command that was actually
//! launched contributes one `cmd_started` / `cmd_finished` pair.
//!
//! The JSON shape of [`Event`] is what monitoring tools parse:
//!
//! ```json
//! {"kind":"cmd_finished","time":"2024-01-01T00:00:00Z",
//!  "fields":{"cmd":"false","duration":"2.1ms","err":"..."},"error":"..."}
//! ```
//!
//! The `fields` keys (`cmd`, `duration`, `err`) are stable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exec::Command;

/// Time source for event timestamps. Swapped out in tests for a
/// deterministic one.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

pub const FIELD_CMD: &str = "cmd";
pub const FIELD_DURATION: &str = "duration";
pub const FIELD_ERR: &str = "err";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunStarted,
    CmdStarted,
    CmdFinished,
    RunFinished,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RunStarted => "run_started",
            EventKind::CmdStarted => "cmd_started",
            EventKind::CmdFinished => "cmd_finished",
            EventKind::RunFinished => "run_finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    /// Also accepts the older `started` / `finished` names for the run-level
    /// kinds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run_started" | "started" => Ok(EventKind::RunStarted),
            "cmd_started" => Ok(EventKind::CmdStarted),
            "cmd_finished" => Ok(EventKind::CmdFinished),
            "run_finished" | "finished" => Ok(EventKind::RunFinished),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Event {
    fn new(kind: EventKind, time: DateTime<Utc>) -> Self {
        Self {
            kind,
            time,
            fields: BTreeMap::new(),
            error: None,
        }
    }

    fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    fn with_error(mut self, err: Option<&dyn std::error::Error>) -> Self {
        if let Some(err) = err {
            let message = err.to_string();
            self.fields.insert(FIELD_ERR.to_string(), message.clone());
            self.error = Some(message);
        }
        self
    }

    pub fn run_started(time: DateTime<Utc>) -> Self {
        Self::new(EventKind::RunStarted, time)
    }

    pub fn cmd_started(time: DateTime<Utc>, cmd: &Command) -> Self {
        Self::new(EventKind::CmdStarted, time).with_field(FIELD_CMD, cmd.description())
    }

    pub fn cmd_finished(
        time: DateTime<Utc>,
        cmd: &Command,
        started_at: DateTime<Utc>,
        err: Option<&dyn std::error::Error>,
    ) -> Self {
        Self::new(EventKind::CmdFinished, time)
            .with_field(FIELD_CMD, cmd.description())
            .with_field(FIELD_DURATION, format_elapsed(started_at, time))
            .with_error(err)
    }

    pub fn run_finished(
        time: DateTime<Utc>,
        started_at: DateTime<Utc>,
        err: Option<&dyn std::error::Error>,
    ) -> Self {
        Self::new(EventKind::RunFinished, time)
            .with_field(FIELD_DURATION, format_elapsed(started_at, time))
            .with_error(err)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Render as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Elapsed wall time between two clock readings, zero if the clock went
/// backwards.
fn format_elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let elapsed = (to - from).to_std().unwrap_or(Duration::ZERO);
    format!("{elapsed:?}")
}

/// Receives lifecycle events.
///
/// Called synchronously from whichever task emits the event, sometimes while
/// a controller lock is held, so implementations must return promptly. A sink
/// that needs to do slow work should hand the event off to a channel.
pub trait EventSink: Send + Sync {
    fn handle(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle(&self, event: &Event) {
        self(event)
    }
}

/// Default sink: one JSON line per event on the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn handle(&self, event: &Event) {
        match event.to_json() {
            Ok(line) => info!(target: "parallel_exec::event", "{line}"),
            Err(_) => info!(target: "parallel_exec::event", "{}", event.kind),
        }
    }
}
