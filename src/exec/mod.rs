// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] describes one external command and knows how to launch it
//!   with `tokio::process::Command`.
//! - [`controller`] owns a single command's start / wait / kill lifecycle.
//! - [`gate`] bounds how many controllers may be running at once.

pub mod command;
pub mod controller;
pub mod gate;

pub use command::{Command, OutputMode};
pub use controller::{Phase, ProcessController};
pub use gate::{ConcurrencyGate, GateError, GatePermit};
