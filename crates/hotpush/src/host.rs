//! Blocking facade for hosts without an async runtime

use crate::client::{CheckHandle, ClientEvents, HcpClient};
use hotpush_core::{CheckOutcome, ClientEvent, ClientSettings, HcpError, HcpResult, LogLevel};
use hotpush_logging::{LogSink, ReloadHandle, init_logging};
use hotpush_runtime::{AsyncRuntime, RuntimeConfig};
use hotpush_transport::{AssetTransport, HttpTransport};
use std::sync::Arc;
use std::time::Duration;

/// An [`HcpClient`] together with the runtime it runs on
///
/// Checks still run in the background; only [`wait_for_check`] and
/// [`next_event_timeout`] block the calling thread.
///
/// [`wait_for_check`]: HotPushHost::wait_for_check
/// [`next_event_timeout`]: HotPushHost::next_event_timeout
pub struct HotPushHost {
    runtime: AsyncRuntime,
    client: HcpClient,
    events: ClientEvents,
    logging: Option<ReloadHandle>,
}

impl HotPushHost {
    /// Create a host talking HTTP, logging to `sink` when one is given
    pub fn new(settings: ClientSettings, sink: Option<Arc<dyn LogSink>>) -> HcpResult<Self> {
        let transport = HttpTransport::new(&settings)?;
        Self::with_transport(settings, Arc::new(transport), sink)
    }

    pub fn with_transport(
        settings: ClientSettings,
        transport: Arc<dyn AssetTransport>,
        sink: Option<Arc<dyn LogSink>>,
    ) -> HcpResult<Self> {
        let logging = sink.map(|sink| init_logging(sink, settings.log_level()));
        let runtime = AsyncRuntime::new(RuntimeConfig::default())?;
        let (client, events) = HcpClient::with_shutdown(
            settings,
            transport,
            runtime.spawner(),
            runtime.shutdown_handle(),
        );

        Ok(Self {
            runtime,
            client,
            events,
            logging,
        })
    }

    pub fn client(&self) -> &HcpClient {
        &self.client
    }

    pub fn init(&self) -> HcpResult<()> {
        self.client.init()
    }

    /// Start a check without blocking
    pub fn check_for_updates(&self) -> CheckHandle {
        self.client.check_for_updates()
    }

    /// Block until `handle` finishes
    pub fn wait_for_check(&self, handle: CheckHandle) -> CheckOutcome {
        self.runtime.block_on(handle.outcome())
    }

    pub fn on_reset(&self) -> HcpResult<()> {
        self.client.on_reset()
    }

    /// Next queued notification, if any
    pub fn try_next_event(&mut self) -> Option<ClientEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `timeout` for the next notification
    pub fn next_event_timeout(&mut self, timeout: Duration) -> Option<ClientEvent> {
        let events = &mut self.events;
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, events.recv()).await })
            .ok()
            .flatten()
    }

    /// Change the level of the installed log sink
    pub fn set_log_level(&self, level: LogLevel) -> HcpResult<()> {
        match &self.logging {
            Some(handle) => handle.reload_level(level).map_err(HcpError::RuntimeError),
            None => Ok(()),
        }
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.logging.as_ref().map(ReloadHandle::level)
    }

    /// Cancel any running check and wait for background work to stop
    ///
    /// The client shares the runtime's shutdown handle, so stopping the
    /// runtime is what cancels the check.
    pub fn shutdown(self, timeout: Duration) -> HcpResult<()> {
        self.runtime.shutdown(timeout)
    }
}
