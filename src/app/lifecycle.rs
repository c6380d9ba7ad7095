use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Process-wide "keep running" flag shared by the input side, the receive
/// loop and the interrupt handler.
#[derive(Debug)]
pub struct Lifecycle {
    running: AtomicBool,
    stop: Notify,
}

impl Lifecycle {
    /// Starts in the running state.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            stop: Notify::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.stop.notify_waiters();
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
