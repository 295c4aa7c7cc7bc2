//! Tracked task spawning

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct TaskCounter {
    active: AtomicUsize,
    idle: Notify,
}

/// Decrements the active count when a tracked task finishes or is aborted
struct TaskGuard(Arc<TaskCounter>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.0.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawns background tasks on a Tokio runtime and keeps count of them
///
/// Clones share the same count, so whoever owns the runtime can wait for
/// all tasks spawned through any clone.
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    handle: Handle,
    tasks: Arc<TaskCounter>,
}

impl TaskSpawner {
    /// Spawn onto the runtime behind `handle`
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tasks: Arc::new(TaskCounter::default()),
        }
    }

    /// Spawn onto the runtime of the calling task
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tasks.active.fetch_add(1, Ordering::AcqRel);
        let guard = TaskGuard(self.tasks.clone());
        self.handle.spawn(async move {
            let _guard = guard;
            future.await
        })
    }

    /// Run blocking work on the runtime's blocking pool
    ///
    /// The work is tracked like any other task and runs to completion even
    /// if its handle is dropped or aborted.
    pub fn spawn_blocking<F, R>(&self, func: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.tasks.active.fetch_add(1, Ordering::AcqRel);
        let guard = TaskGuard(self.tasks.clone());
        self.handle.spawn_blocking(move || {
            let _guard = guard;
            func()
        })
    }

    /// Number of tracked tasks still running
    pub fn active_tasks(&self) -> usize {
        self.tasks.active.load(Ordering::Acquire)
    }

    /// Wait until no tracked task is running, up to `timeout`
    ///
    /// Returns `true` if every task finished in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.tasks.idle.notified();
                if self.active_tasks() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}
