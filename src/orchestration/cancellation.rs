//! Run-level cancellation.
//!
//! Resource workers only look at the flag between stages, so a cancelled run
//! never leaves a record half-written inside a stage.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Cloneable handle shared by the orchestrator, its workers and signal handlers
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the first reason wins
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut current = self.reason.lock();
        if current.is_none() {
            warn!(reason = %reason, "🛑 Migration run cancelled");
            *current = Some(reason);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }
}
