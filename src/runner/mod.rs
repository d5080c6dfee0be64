// src/runner/mod.rs

//! Orchestration of a whole run.
//!
//! [`Runner::run_until`] builds one [`ProcessController`] per command and
//! spawns one Tokio task per controller. Each task waits for a slot in the
//! [`ConcurrencyGate`] before starting its command. Two more tasks are
//! spawned next to them:
//!
//! - an aggregator that signals once every per-command task has returned
//! - a watcher that signals when the interruption future resolves
//!
//! The runner sleeps until the first completion signal (fast-fail, all done,
//! or interrupted), then kills every controller. `kill()` is idempotent, so
//! this sweep is unconditional; afterwards every controller is `Finished` and
//! no process outlives the call.
//!
//! The aggregate outcome is reduced by the runner alone: per-command tasks
//! only set a shared "failed" flag, and the signal that woke the runner
//! decides between `Interrupted` and `CommandFailed`. When fast-fail and an
//! interruption fire close together, whichever reaches the channel first
//! wins.

pub mod options;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::events::Event;
use crate::exec::{Command, ConcurrencyGate, ProcessController};

pub use options::{default_max_concurrent, RunnerOptions};

/// Why the runner woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    FastFail,
    AllDone,
    Interrupted,
}

/// Flags shared between the runner and its per-command tasks.
#[derive(Debug, Default)]
struct RunProgress {
    failed: AtomicBool,
    stopping: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: RunnerOptions,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Run all commands, treating Ctrl-C as the interruption request.
    pub async fn run(&self, commands: Vec<Command>) -> Result<(), RunError> {
        self.run_until(commands, ctrl_c()).await
    }

    /// Run all commands; `interrupt` resolving counts as an external
    /// interruption.
    pub async fn run_until<F>(&self, commands: Vec<Command>, interrupt: F) -> Result<(), RunError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let controllers: Vec<Arc<ProcessController>> = commands
            .into_iter()
            .map(|command| {
                Arc::new(ProcessController::new(
                    command,
                    Arc::clone(&self.options.event_sink),
                    Arc::clone(&self.options.clock),
                ))
            })
            .collect();

        self.drive(&controllers, interrupt).await
    }

    async fn drive<F>(
        &self,
        controllers: &[Arc<ProcessController>],
        interrupt: F,
    ) -> Result<(), RunError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let options = &self.options;
        let started_at = (options.clock)();
        options.event_sink.handle(&Event::run_started(started_at));
        info!(
            commands = controllers.len(),
            fast_fail = options.fast_fail,
            max_concurrent = options.max_concurrent,
            "run started"
        );

        let gate = ConcurrencyGate::new(options.max_concurrent);
        let progress = Arc::new(RunProgress::default());
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        let mut tasks = JoinSet::new();
        for controller in controllers {
            tasks.spawn(run_admitted(
                Arc::clone(controller),
                gate.clone(),
                Arc::clone(&progress),
                options.fast_fail,
                done_tx.clone(),
            ));
        }

        // Per-command tasks wind down on their own once every controller is
        // Finished, so the aggregator is left detached.
        {
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                while let Some(joined) = tasks.join_next().await {
                    if let Err(e) = joined {
                        warn!(error = %e, "command task did not complete");
                    }
                }
                let _ = done_tx.send(Completion::AllDone);
            });
        }

        let watcher = {
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                interrupt.await;
                let _ = done_tx.send(Completion::Interrupted);
            })
        };
        drop(done_tx);

        let cause = done_rx.recv().await.unwrap_or(Completion::AllDone);
        progress.stopping.store(true, Ordering::SeqCst);
        watcher.abort();
        debug!(?cause, "run woke up; killing remaining commands");

        for controller in controllers {
            controller.kill().await;
        }

        let outcome = match cause {
            Completion::Interrupted => Err(RunError::Interrupted),
            _ if progress.failed.load(Ordering::SeqCst) => Err(RunError::CommandFailed),
            _ => Ok(()),
        };

        let finished_at = (options.clock)();
        options.event_sink.handle(&Event::run_finished(
            finished_at,
            started_at,
            outcome.as_ref().err().map(|e| e as &dyn std::error::Error),
        ));

        match &outcome {
            Ok(()) => info!("run finished"),
            Err(err) => warn!(error = %err, "run finished with error"),
        }
        outcome
    }
}

/// Body of one per-command task: wait for a slot, then run the command
/// unless the run is already stopping.
async fn run_admitted(
    controller: Arc<ProcessController>,
    gate: ConcurrencyGate,
    progress: Arc<RunProgress>,
    fast_fail: bool,
    done_tx: mpsc::UnboundedSender<Completion>,
) {
    let permit = match gate.acquire(1).await {
        Ok(permit) => permit,
        Err(err) => {
            warn!(error = %err, cmd = %controller.command().description(), "no slot for command");
            return;
        }
    };

    if progress.stopping.load(Ordering::SeqCst) {
        debug!(cmd = %controller.command().description(), "run is stopping; not starting command");
        return;
    }

    if !controller.run().await {
        progress.failed.store(true, Ordering::SeqCst);
        if fast_fail {
            // Set before the slot is handed on so queued commands never start.
            progress.stopping.store(true, Ordering::SeqCst);
            let _ = done_tx.send(Completion::FastFail);
        }
    }

    permit.release();
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; interruption disabled");
        std::future::pending::<()>().await;
    }
    info!("interrupt received");
}
