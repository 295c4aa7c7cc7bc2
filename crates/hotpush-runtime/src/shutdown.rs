//! Cooperative cancellation

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Handle for triggering shutdown
///
/// Triggering is sticky: once set, every current and future
/// [`ShutdownSignal`] observes it. Clones trigger the same signal.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Trigger shutdown; repeated calls are no-ops
    pub fn trigger(&self) {
        self.sender.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Get a signal that can be moved into tasks
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal for detecting shutdown
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Check if shutdown has been triggered (non-blocking)
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for shutdown to be triggered
    ///
    /// Returns immediately if already triggered. Never returns if the handle
    /// is dropped without triggering.
    pub async fn wait(&mut self) {
        if self.receiver.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Owned future completing on shutdown, for use in `select!`
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut signal = self.clone();
        async move { signal.wait().await }
    }
}

#[cfg(test)]
#[path = "shutdown/shutdown_tests.rs"]
mod shutdown_tests;
