use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger::{self, LogTag};

// ═══════════════════════════════════════════════════════════════════════════════
// SHUTDOWN MANAGEMENT
// ═══════════════════════════════════════════════════════════════════════════════
//
// Process-wide shutdown coordination:
// 1. Signal received - flag set, Notify broadcast to all waiting loops
// 2. Periodic loops return at their next tick boundary
// 3. Backfill / cleanup check the flag between pages and batches
// 4. run::start() joins service handles with a grace period
// ═══════════════════════════════════════════════════════════════════════════════

pub static SHUTDOWN: Lazy<ShutdownHandle> = Lazy::new(ShutdownHandle::new);

/// Cancellation handle shared by every background service
pub struct ShutdownHandle {
    requested: AtomicBool,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request shutdown; idempotent, wakes every waiter
    pub fn request(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            logger::warning(LogTag::System, "Shutdown requested");
        }
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Notify handle for `select!`ing against in service loops
    ///
    /// Loops must re-check `is_requested()` after waking; `Notify` carries no
    /// payload and a waiter registered after `request()` would miss the wake
    /// without the flag.
    pub fn notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Wait until shutdown is requested
    pub async fn wait(&self) {
        while !self.is_requested() {
            let notified = self.notify.notified();
            if self.is_requested() {
                break;
            }
            notified.await;
        }
    }
}

/// Convenience: has a shutdown been requested?
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN.is_requested()
}

/// Convenience: request process shutdown
pub fn request_shutdown() {
    SHUTDOWN.request();
}

/// Install the Ctrl-C handler that triggers graceful shutdown
pub fn install_ctrlc_handler() -> Result<(), String> {
    ctrlc::set_handler(|| {
        request_shutdown();
    })
    .map_err(|e| format!("Failed to set Ctrl-C handler: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_after_request() {
        let handle = ShutdownHandle::new();
        assert!(!handle.is_requested());

        handle.request();
        assert!(handle.is_requested());

        // Must not hang even though request() happened before wait()
        handle.wait().await;
    }
}
