// src/runner/options.rs

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::events::{system_clock, Clock, EventSink, LogEventSink};

/// Configuration for one [`Runner`](super::Runner).
///
/// Built explicitly per invocation; the defaults are:
/// - `fast_fail = false`
/// - `max_concurrent` = the host's available parallelism (`0` = unlimited)
/// - events logged as JSON lines through `tracing`
/// - the system clock
#[derive(Clone)]
pub struct RunnerOptions {
    pub fast_fail: bool,
    pub max_concurrent: usize,
    pub event_sink: Arc<dyn EventSink>,
    pub clock: Clock,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            fast_fail: false,
            max_concurrent: default_max_concurrent(),
            event_sink: Arc::new(LogEventSink),
            clock: system_clock(),
        }
    }
}

impl fmt::Debug for RunnerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerOptions")
            .field("fast_fail", &self.fast_fail)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl RunnerOptions {
    /// Stop the whole run as soon as one command fails.
    pub fn with_fast_fail(mut self, fast_fail: bool) -> Self {
        self.fast_fail = fast_fail;
        self
    }

    /// Maximum number of processes alive at once, `0` for unlimited.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.event_sink = Arc::new(sink);
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }
}

/// Host parallelism hint, falling back to 1 when it cannot be determined.
pub fn default_max_concurrent() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
