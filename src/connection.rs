//! Connection management utilities for Passage.
//!
//! This module provides utilities for managing connections, including:
//! - Connection limiting with semaphores
//! - Active connection tracking with drop guards
//! - Graceful shutdown support

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct TrackerState {
    active: AtomicUsize,
    idle: Notify,
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    state: Arc<TrackerState>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the returned guard is dropped.
    pub fn track(&self) -> ConnectionGuard {
        self.state.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            state: self.state.clone(),
        }
    }

    /// Get current active connection count.
    pub fn count(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Wait for all connections to finish with timeout.
    /// Returns true if all connections finished, false if timeout reached.
    pub async fn wait_for_shutdown(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                // registered before the check so a concurrent last drop is not missed
                let idle = self.state.idle.notified();
                if self.count() == 0 {
                    return;
                }
                idle.await;
            }
        };

        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

/// Keeps a connection counted by its [`ConnectionTracker`].
#[derive(Debug)]
pub struct ConnectionGuard {
    state: Arc<TrackerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.state.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}

/// Outcome of asking the [`ConnectionLimiter`] for room.
#[derive(Debug)]
pub enum Admission {
    /// No limit is configured.
    Unlimited,
    /// Admitted; the slot is freed when the permit is dropped.
    Admitted(OwnedSemaphorePermit),
    /// Every slot is taken.
    Rejected,
}

impl Admission {
    /// Returns `true` unless the connection must be refused.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Configuration for connection limiting.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    semaphore: Option<Arc<Semaphore>>,
    max_connections: usize,
}

impl ConnectionLimiter {
    /// Create a new connection limiter.
    /// If max_connections is 0, no limit is enforced.
    pub fn new(max_connections: usize) -> Self {
        let semaphore = (max_connections > 0).then(|| Arc::new(Semaphore::new(max_connections)));

        Self {
            semaphore,
            max_connections,
        }
    }

    /// Check if connection limiting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.semaphore.is_some()
    }

    /// Get the maximum number of connections (0 means unlimited).
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Claims a slot for a new connection without waiting.
    pub fn admit(&self) -> Admission {
        match &self.semaphore {
            None => Admission::Unlimited,
            Some(sem) => match sem.clone().try_acquire_owned() {
                Ok(permit) => Admission::Admitted(permit),
                Err(_) => Admission::Rejected,
            },
        }
    }
}
