//! Owned Tokio runtime for synchronous hosts

use crate::shutdown::{ShutdownHandle, ShutdownSignal};
use crate::spawner::TaskSpawner;
use hotpush_core::{HcpError, HcpResult};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Configuration for the owned runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of worker threads
    pub worker_threads: usize,
    /// Name prefix for worker threads
    pub thread_name: String,
    /// Maximum blocking threads
    pub max_blocking_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "hotpush-worker".to_string(),
            max_blocking_threads: 8,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads (at least one)
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// A multi-threaded Tokio runtime owned by the host facade
///
/// Update checks only need a couple of worker threads; hosts that already
/// run Tokio should use a [`TaskSpawner`] on their own runtime instead.
pub struct AsyncRuntime {
    runtime: Runtime,
    spawner: TaskSpawner,
    shutdown: ShutdownHandle,
    config: RuntimeConfig,
}

impl AsyncRuntime {
    pub fn new(config: RuntimeConfig) -> HcpResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name(&config.thread_name)
            .max_blocking_threads(config.max_blocking_threads.max(1))
            .enable_all()
            .build()
            .map_err(|e| HcpError::RuntimeError(format!("failed to create runtime: {e}")))?;

        let spawner = TaskSpawner::new(runtime.handle().clone());

        Ok(Self {
            runtime,
            spawner,
            shutdown: ShutdownHandle::new(),
            config,
        })
    }

    pub fn with_defaults() -> HcpResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Spawner whose tasks are awaited by [`AsyncRuntime::shutdown`]
    pub fn spawner(&self) -> TaskSpawner {
        self.spawner.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Handle triggered by [`AsyncRuntime::shutdown`], for components that
    /// also cancel on their own
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Block on a future from a sync context
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.spawner.spawn(future)
    }

    /// Signal shutdown and wait for tracked tasks, up to `timeout`
    ///
    /// Returns a `RuntimeError` naming the number of tasks still running
    /// when the timeout expires.
    pub fn shutdown(&self, timeout: Duration) -> HcpResult<()> {
        tracing::info!(?timeout, "shutting down runtime");
        self.shutdown.trigger();

        let spawner = self.spawner.clone();
        if self.runtime.block_on(async move { spawner.wait_idle(timeout).await }) {
            tracing::info!("runtime shutdown complete");
            Ok(())
        } else {
            let remaining = self.spawner.active_tasks();
            tracing::warn!(remaining, "runtime shutdown timed out");
            Err(HcpError::RuntimeError(format!(
                "{remaining} task(s) still running after {timeout:?}"
            )))
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

impl Drop for AsyncRuntime {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
#[path = "runtime/runtime_tests.rs"]
mod runtime_tests;
