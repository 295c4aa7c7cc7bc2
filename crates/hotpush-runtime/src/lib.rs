//! hotpush-runtime - Tokio runtime ownership and cancellation
//!
//! This crate provides:
//! - [`AsyncRuntime`] for hosts that do not run their own Tokio runtime
//! - [`TaskSpawner`] for spawning tracked background tasks on any runtime
//! - [`ShutdownHandle`] and [`ShutdownSignal`] for cooperative cancellation

mod runtime;
mod shutdown;
mod spawner;

pub use runtime::{AsyncRuntime, RuntimeConfig};
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use spawner::TaskSpawner;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AsyncRuntime, RuntimeConfig, ShutdownHandle, ShutdownSignal, TaskSpawner};
}
