//! Deterministic clocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// Clock that starts at the Unix epoch and advances a fixed step on every
/// reading.
#[derive(Debug, Clone)]
pub struct StepClock {
    next_ms: Arc<AtomicI64>,
    step_ms: i64,
}

impl StepClock {
    pub fn new(step_ms: i64) -> Self {
        Self {
            next_ms: Arc::new(AtomicI64::new(0)),
            step_ms,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let ms = self.next_ms.fetch_add(self.step_ms, Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .expect("step clock overflowed")
    }

    /// Closure form, for `RunnerOptions::with_clock`.
    pub fn as_fn(&self) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let clock = self.clone();
        move || clock.now()
    }
}
