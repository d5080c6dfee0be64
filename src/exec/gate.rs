// src/exec/gate.rs

//! Count-based admission control.
//!
//! A [`ConcurrencyGate`] bounds how many processes may be active at once. A
//! capacity of `0` means "unlimited": every acquire succeeds immediately and
//! nothing is tracked.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("requested {requested} permits from a gate with capacity {capacity}")]
    ExceedsCapacity { requested: u32, capacity: usize },

    #[error("concurrency gate closed")]
    Closed,
}

/// Counting gate shared by all per-command tasks of one run.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    capacity: usize,
    permits: Option<Arc<Semaphore>>,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        let permits = (capacity > 0).then(|| Arc::new(Semaphore::new(capacity)));
        Self { capacity, permits }
    }

    /// A gate that never blocks.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn is_unlimited(&self) -> bool {
        self.permits.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free, or `None` for an unlimited gate.
    pub fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|s| s.available_permits())
    }

    /// Wait until `n` permits are free and take them.
    ///
    /// The permits go back to the gate when the returned [`GatePermit`] is
    /// released or dropped.
    pub async fn acquire(&self, n: u32) -> Result<GatePermit, GateError> {
        let Some(semaphore) = &self.permits else {
            return Ok(GatePermit { inner: None });
        };

        if n as usize > self.capacity {
            return Err(GateError::ExceedsCapacity {
                requested: n,
                capacity: self.capacity,
            });
        }

        let permit = Arc::clone(semaphore)
            .acquire_many_owned(n)
            .await
            .map_err(|_| GateError::Closed)?;

        Ok(GatePermit {
            inner: Some(permit),
        })
    }
}

/// Permits held against a [`ConcurrencyGate`].
#[derive(Debug)]
#[must_use = "permits are returned as soon as the guard is dropped"]
pub struct GatePermit {
    inner: Option<OwnedSemaphorePermit>,
}

impl GatePermit {
    pub fn count(&self) -> usize {
        self.inner.as_ref().map_or(0, |p| p.num_permits())
    }

    /// Return the permits to the gate.
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn unlimited_gate_never_blocks() {
        let gate = ConcurrencyGate::unlimited();
        let mut held = Vec::new();
        for _ in 0..10_000 {
            held.push(gate.acquire(1).await.unwrap());
        }
        assert!(gate.is_unlimited());
        assert_eq!(gate.available(), None);
        assert!(held.iter().all(|p| p.count() == 0));
    }

    #[tokio::test]
    async fn bounded_gate_blocks_until_release() {
        let gate = ConcurrencyGate::new(2);
        let first = gate.acquire(1).await.unwrap();
        let _second = gate.acquire(1).await.unwrap();
        assert_eq!(gate.available(), Some(0));

        let blocked = timeout(Duration::from_millis(50), gate.acquire(1)).await;
        assert!(blocked.is_err(), "third acquire should wait for capacity");

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire(1).await.map(|p| p.count()) })
        };
        first.release();

        let admitted = timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be admitted")
            .unwrap();
        assert_eq!(admitted, Ok(1));
    }

    #[tokio::test]
    async fn acquiring_more_than_capacity_is_rejected() {
        let gate = ConcurrencyGate::new(3);
        let err = gate.acquire(4).await.unwrap_err();
        assert_eq!(
            err,
            GateError::ExceedsCapacity {
                requested: 4,
                capacity: 3
            }
        );

        let all = gate.acquire(3).await.unwrap();
        assert_eq!(all.count(), 3);
        assert_eq!(gate.available(), Some(0));
        drop(all);
        assert_eq!(gate.available(), Some(3));
    }
}
