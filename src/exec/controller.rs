// src/exec/controller.rs

//! Lifecycle owner for a single command.
//!
//! A [`ProcessController`] moves through `Idle → Running → Finished`, or
//! straight from `Idle` to `Finished` when it is killed before it ever
//! started. `run()` and `kill()` may be called concurrently from different
//! tasks; the state lock guarantees at most one `cmd_started` and one
//! `cmd_finished` event per controller and that no process is launched after
//! a kill.
//!
//! The state lock is never held across an `.await`. A kill of a running
//! command is delivered to the task blocked in `run()` over a oneshot
//! channel, because that task is the one holding the `Child`.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::CommandError;
use crate::events::{Clock, Event, EventSink};
use crate::exec::Command;

/// Channel on which the running task reports the result of its kill attempt.
type KillReply = oneshot::Sender<io::Result<()>>;

enum ControllerState {
    Idle,
    Running {
        started_at: DateTime<Utc>,
        kill_tx: oneshot::Sender<KillReply>,
    },
    Finished,
}

/// Observable lifecycle phase of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

pub struct ProcessController {
    command: Command,
    sink: Arc<dyn EventSink>,
    clock: Clock,
    state: Mutex<ControllerState>,
}

impl fmt::Debug for ProcessController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessController")
            .field("command", &self.command)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl ProcessController {
    pub fn new(command: Command, sink: Arc<dyn EventSink>, clock: Clock) -> Self {
        Self {
            command,
            sink,
            clock,
            state: Mutex::new(ControllerState::Idle),
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn phase(&self) -> Phase {
        match *self.lock_state() {
            ControllerState::Idle => Phase::Idle,
            ControllerState::Running { .. } => Phase::Running,
            ControllerState::Finished => Phase::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::Finished
    }

    /// Launch the command and wait for it to exit.
    ///
    /// Returns `false` only for a failure this call observed itself: the
    /// process could not be launched, or it exited unsuccessfully. Calling
    /// `run()` on a controller that already started or was killed is a no-op
    /// returning `true`, and so is a run whose process was killed mid-flight.
    pub async fn run(&self) -> bool {
        let (started_at, kill_rx) = {
            let mut state = self.lock_state();
            if !matches!(*state, ControllerState::Idle) {
                return true;
            }

            let started_at = (self.clock)();
            let (kill_tx, kill_rx) = oneshot::channel::<KillReply>();
            *state = ControllerState::Running {
                started_at,
                kill_tx,
            };
            self.sink
                .handle(&Event::cmd_started(started_at, &self.command));
            (started_at, kill_rx)
        };

        let description = self.command.description();
        info!(cmd = %description, "starting command process");

        let mut child = match self.command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = CommandError::Start {
                    cmd: description,
                    source,
                };
                return self.finish(started_at, Some(err));
            }
        };

        // Either the process exits on its own, or `kill()` asks us to stop it.
        let exit_error = tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => None,
                Ok(status) => Some(CommandError::Exit {
                    cmd: description.clone(),
                    status,
                }),
                Err(source) => Some(CommandError::Wait {
                    cmd: description.clone(),
                    source,
                }),
            },

            Ok(reply) = kill_rx => {
                info!(cmd = %description, "kill requested; terminating process");
                let _ = reply.send(child.start_kill());
                if let Err(e) = child.wait().await {
                    debug!(cmd = %description, error = %e, "failed to reap killed process");
                }
                // `kill()` already moved us to Finished and reports the outcome.
                return true;
            }
        };

        self.finish(started_at, exit_error)
    }

    /// Terminate the command, or prevent it from ever starting.
    ///
    /// Idempotent. A controller killed while `Idle` finishes silently; a
    /// running one emits `cmd_finished`, carrying an error only if the
    /// termination request itself failed.
    pub async fn kill(&self) {
        let (started_at, kill_tx) = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, ControllerState::Finished) {
                ControllerState::Idle => {
                    debug!(cmd = %self.command.description(), "killed before start");
                    return;
                }
                ControllerState::Finished => return,
                ControllerState::Running {
                    started_at,
                    kill_tx,
                } => (started_at, kill_tx),
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let result = match kill_tx.send(reply_tx) {
            Ok(()) => reply_rx.await.unwrap_or_else(|_| Err(already_finished())),
            // The run task stopped listening: the process already exited.
            Err(_) => Err(already_finished()),
        };

        let error = result.err().map(|source| CommandError::Kill {
            cmd: self.command.description(),
            source,
        });
        if let Some(err) = &error {
            warn!(error = %err, "kill did not succeed");
        }

        let finished_at = (self.clock)();
        self.sink.handle(&Event::cmd_finished(
            finished_at,
            &self.command,
            started_at,
            error.as_ref().map(|e| e as &dyn std::error::Error),
        ));
    }

    /// Move to `Finished` after `run()` observed the end of the process.
    ///
    /// Returns `true` without emitting if a concurrent `kill()` got there
    /// first.
    fn finish(&self, started_at: DateTime<Utc>, error: Option<CommandError>) -> bool {
        let mut state = self.lock_state();
        if matches!(*state, ControllerState::Finished) {
            debug!(
                cmd = %self.command.description(),
                "already finished by kill; dropping exit result"
            );
            return true;
        }
        *state = ControllerState::Finished;

        match &error {
            Some(err) => warn!(error = %err, "command failed"),
            None => info!(cmd = %self.command.description(), "command succeeded"),
        }

        let finished_at = (self.clock)();
        self.sink.handle(&Event::cmd_finished(
            finished_at,
            &self.command,
            started_at,
            error.as_ref().map(|e| e as &dyn std::error::Error),
        ));
        error.is_none()
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn already_finished() -> io::Error {
    io::Error::other("process already finished")
}
