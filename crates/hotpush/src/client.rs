//! The hot code push client
//!
//! [`HcpClient`] is the single owner of the configuration record and of the
//! current and pending bundle pointers. Every mutation of those, together
//! with the config write it implies, happens under one lock that is never
//! held across an `.await`.

use crate::manager::{AssetBundleManager, DownloadPolicy, ManagerConfig, UpdateCheck};
use hotpush_bundle::{AssetBundle, AssetManifest};
use hotpush_core::{
    CheckOutcome, ClientConfig, ClientEvent, ClientSettings, ClientState, ConfigStore,
    DownloadDecision, HcpError, HcpResult,
};
use hotpush_logging::component_span;
use hotpush_runtime::{ShutdownHandle, TaskSpawner};
use hotpush_transport::{AssetTransport, UpdateEndpoint};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, Span};

/// Receiving end of the host notification channel
pub type ClientEvents = mpsc::UnboundedReceiver<ClientEvent>;

/// Hot code push client
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct HcpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    settings: ClientSettings,
    store: ConfigStore,
    endpoint: UpdateEndpoint,
    transport: Arc<dyn AssetTransport>,
    spawner: TaskSpawner,
    shutdown: ShutdownHandle,
    events: mpsc::UnboundedSender<ClientEvent>,
    slots: Mutex<ClientSlots>,
    span: Span,
}

/// Everything guarded by the client lock
#[derive(Default)]
struct ClientSlots {
    lifecycle: ClientState,
    config: ClientConfig,
    initial: Option<Arc<AssetBundle>>,
    current: Option<Arc<AssetBundle>>,
    pending: Option<Arc<AssetBundle>>,
    manager: Option<AssetBundleManager>,
}

impl ClientSlots {
    fn transition_to(&mut self, next: ClientState) -> HcpResult<()> {
        if !self.lifecycle.can_transition_to(next) {
            return Err(HcpError::InvalidState {
                expected: format!("a state that can move to {next}"),
                actual: self.lifecycle.to_string(),
            });
        }
        self.lifecycle = next;
        Ok(())
    }

    fn ensure_initialized(&self) -> HcpResult<()> {
        if self.lifecycle.is_initialized() {
            Ok(())
        } else {
            Err(HcpError::InvalidState {
                expected: ClientState::Ready.to_string(),
                actual: self.lifecycle.to_string(),
            })
        }
    }

    /// Current and initial bundles of an initialized client
    fn bundles(&self) -> HcpResult<(Arc<AssetBundle>, Arc<AssetBundle>)> {
        self.ensure_initialized()?;
        match (&self.current, &self.initial) {
            (Some(current), Some(initial)) => Ok((current.clone(), initial.clone())),
            _ => Err(HcpError::Internal(
                "initialized client without bundles".to_string(),
            )),
        }
    }

    /// Find a bundle by version among the initial and downloaded ones
    fn resolve(&self, version: &str) -> Option<Arc<AssetBundle>> {
        match &self.initial {
            Some(initial) if initial.version() == version => Some(initial.clone()),
            _ => self
                .manager
                .as_ref()
                .and_then(|manager| manager.downloaded_bundle(version)),
        }
    }

    fn decide(&self, version: &str, compatibility: Option<&str>) -> DownloadDecision {
        let current = self.current.as_deref();

        if current.is_some_and(|c| c.version() == version) {
            return DownloadDecision::AlreadyCurrent;
        }
        if self.pending.as_deref().is_some_and(|p| p.version() == version) {
            return DownloadDecision::AlreadyPending;
        }
        if self.config.is_blacklisted(version) {
            return DownloadDecision::Blacklisted;
        }
        match (compatibility, current.and_then(|c| c.compatibility_version())) {
            (Some(remote), Some(local)) if remote != local => DownloadDecision::Incompatible,
            _ => DownloadDecision::Accept,
        }
    }
}

impl HcpClient {
    /// Create an uninitialized client
    ///
    /// Background checks are spawned through `spawner`. The returned receiver
    /// yields every notification meant for the host.
    pub fn new(
        settings: ClientSettings,
        transport: Arc<dyn AssetTransport>,
        spawner: TaskSpawner,
    ) -> (Self, ClientEvents) {
        Self::with_shutdown(settings, transport, spawner, ShutdownHandle::new())
    }

    /// Create an uninitialized client cancelled through `shutdown`
    ///
    /// Pass the handle of the runtime behind `spawner` so shutting the
    /// runtime down also cancels a running check.
    pub fn with_shutdown(
        settings: ClientSettings,
        transport: Arc<dyn AssetTransport>,
        spawner: TaskSpawner,
        shutdown: ShutdownHandle,
    ) -> (Self, ClientEvents) {
        let (events, receiver) = mpsc::unbounded_channel();
        let store = ConfigStore::new(settings.config_path());
        let endpoint = UpdateEndpoint::from_settings(&settings);

        let client = Self {
            inner: Arc::new(ClientInner {
                settings,
                store,
                endpoint,
                transport,
                spawner,
                shutdown,
                events,
                slots: Mutex::new(ClientSlots::default()),
                span: component_span("HCPClient"),
            }),
        };
        (client, receiver)
    }

    /// Load configuration and bundles and select the current bundle
    ///
    /// Calling it again on an initialized client does nothing.
    pub fn init(&self) -> HcpResult<()> {
        let inner = &self.inner;
        let mut slots = inner.slots.lock();
        if slots.lifecycle.is_initialized() {
            tracing::debug!(parent: &inner.span, "already initialized");
            return Ok(());
        }

        let (config, created) = inner.store.load_or_create()?;
        if created {
            tracing::info!(parent: &inner.span, path = %inner.store.path().display(), "created configuration file");
        }

        let initial = AssetBundle::load_from(
            inner.settings.initial_bundle_dir(),
            &inner.settings.manifest_name,
            None,
        )?;
        let initial = Arc::new(initial);
        if config.last_seen_initial_version.as_deref() != Some(initial.version()) {
            tracing::info!(parent: &inner.span, version = initial.version(), "new initial version");
        }
        let config = config.with_last_seen_initial(initial.version());

        let manager = AssetBundleManager::new(
            ManagerConfig {
                versions_dir: inner.settings.versions_dir(),
                manifest_name: inner.settings.manifest_name.clone(),
                endpoint: inner.endpoint.clone(),
            },
            inner.transport.clone(),
            inner.spawner.clone(),
            inner.shutdown.signal(),
            initial.version(),
        )?;

        let current = match config.last_downloaded_version.as_deref() {
            None => initial.clone(),
            Some(version) if version == initial.version() => initial.clone(),
            Some(version) if config.is_blacklisted(version) => {
                tracing::warn!(parent: &inner.span, version, "last downloaded version is blacklisted, using initial version");
                initial.clone()
            }
            Some(version) => match manager.downloaded_bundle(version) {
                Some(bundle) => bundle,
                None => {
                    tracing::warn!(parent: &inner.span, version, "last downloaded version not found, using initial version");
                    initial.clone()
                }
            },
        };

        let config = config.with_bundle_identity(
            current.app_id().map(str::to_string),
            current.root_url_string().map(str::to_string),
            current.compatibility_version().map(str::to_string),
        );
        inner.store.save(&config)?;

        slots.config = config;
        slots.initial = Some(initial);
        slots.current = Some(current.clone());
        slots.pending = None;
        slots.manager = Some(manager);
        slots.transition_to(ClientState::Ready)?;

        tracing::info!(parent: &inner.span, version = current.version(), "serving version");
        Ok(())
    }

    /// Start a background check against the current bundle
    ///
    /// Never fails directly: a check that cannot start is reported on the
    /// event channel and the returned handle resolves to
    /// [`CheckOutcome::Failed`] right away.
    pub fn check_for_updates(&self) -> CheckHandle {
        match self.start_check() {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.report(&e);
                CheckHandle::ready(CheckOutcome::Failed(e))
            }
        }
    }

    fn start_check(&self) -> HcpResult<CheckHandle> {
        let inner = &self.inner;
        let (manager, current, update_url) = {
            let mut slots = inner.slots.lock();
            slots.ensure_initialized()?;
            if slots.lifecycle.is_checking() {
                return Err(HcpError::CheckInProgress);
            }
            let (current, _) = slots.bundles()?;
            let manager = slots
                .manager
                .clone()
                .ok_or_else(|| HcpError::Internal("initialized client without manager".to_string()))?;
            let root_url = current
                .root_url_string()
                .ok_or(HcpError::MissingRootUrl)?;
            let update_url = inner.endpoint.update_url(root_url)?;

            slots.transition_to(ClientState::Checking)?;
            (manager, current, update_url)
        };

        tracing::info!(parent: &inner.span, %update_url, "checking for updates");
        let policy: Arc<dyn DownloadPolicy> = inner.clone();
        let task = match manager.check_for_updates(update_url, current, policy) {
            Ok(task) => task,
            Err(e) => {
                inner.finish_state();
                return Err(e);
            }
        };

        let client = inner.clone();
        let span = tracing::debug_span!(parent: &inner.span, "check");
        let handle = inner.spawner.spawn(
            async move {
                let _reset = StateReset(client.clone());
                let mut task = AbortOnDrop(task);
                let result = (&mut task.0).await;
                client.finish_check(result)
            }
            .instrument(span),
        );
        Ok(CheckHandle::running(handle))
    }

    /// Whether the client would download `manifest`
    ///
    /// Blacklisted and incompatible versions are reported as errors.
    pub fn should_download_bundle_for_manifest(&self, manifest: &AssetManifest) -> bool {
        self.inner.evaluate(manifest).is_accept()
    }

    /// Evaluate a remote version without side effects
    ///
    /// Rules apply in order: already current, already pending, blacklisted,
    /// incompatible. The first match wins.
    pub fn decide_download(&self, version: &str, compatibility: Option<&str>) -> DownloadDecision {
        self.inner.slots.lock().decide(version, compatibility)
    }

    /// Record a finished download and make it the pending bundle
    ///
    /// The current bundle is left untouched. A blacklisted bundle is rejected
    /// with [`HcpError::BlacklistedVersion`]. If the config cannot be written
    /// the bundle is not made pending.
    pub fn on_finished_downloading_asset_bundle(
        &self,
        bundle: impl Into<Arc<AssetBundle>>,
    ) -> HcpResult<()> {
        self.inner.finished_downloading(bundle.into())
    }

    /// Promote the pending bundle, if any, and persist the current identity
    ///
    /// Without a pending bundle this re-persists the current identity.
    pub fn on_reset(&self) -> HcpResult<()> {
        let inner = &self.inner;
        let mut slots = inner.slots.lock();
        slots.ensure_initialized()?;

        if let Some(pending) = slots.pending.take() {
            tracing::info!(
                parent: &inner.span,
                from = slots.current.as_deref().map(AssetBundle::version),
                to = pending.version(),
                "promoting pending version"
            );
            slots.current = Some(pending);
        }

        let (current, _) = slots.bundles()?;
        let config = slots.config.clone().with_bundle_identity(
            current.app_id().map(str::to_string),
            current.root_url_string().map(str::to_string),
            current.compatibility_version().map(str::to_string),
        );
        inner.persist(&mut slots, config)
    }

    /// Log `error` and forward it to the host
    pub fn on_error(&self, error: HcpError) {
        self.inner.report(&error);
    }

    /// Mark the current version as having started successfully
    pub fn startup_did_complete(&self) -> HcpResult<()> {
        let inner = &self.inner;
        let mut slots = inner.slots.lock();
        let (current, _) = slots.bundles()?;

        if slots.config.last_known_good_version.as_deref() == Some(current.version()) {
            return Ok(());
        }
        let config = slots.config.clone().with_last_known_good(current.version());
        inner.persist(&mut slots, config)?;
        tracing::info!(parent: &inner.span, version = current.version(), "startup completed");
        Ok(())
    }

    /// Give up on the current version and stage the last known good one
    ///
    /// The current version is blacklisted unless it is the initial one. The
    /// last known good version is staged as pending when usable, otherwise
    /// the initial version is. Returns the staged version, or `None` when the
    /// client already serves the only usable version.
    pub fn revert_to_last_known_good(&self) -> HcpResult<Option<String>> {
        let inner = &self.inner;
        let mut slots = inner.slots.lock();
        let (current, initial) = slots.bundles()?;

        let mut config = slots.config.clone();
        if current.version() != initial.version() {
            tracing::warn!(parent: &inner.span, version = current.version(), "blacklisting version");
            config = config.with_blacklisted(current.version());
        }

        let target = config
            .last_known_good_version
            .as_deref()
            .filter(|version| *version != current.version() && !config.is_blacklisted(version))
            .and_then(|version| slots.resolve(version))
            .or_else(|| (initial.version() != current.version()).then(|| initial.clone()));

        let Some(target) = target else {
            inner.persist(&mut slots, config)?;
            tracing::info!(parent: &inner.span, "no version to revert to");
            return Ok(None);
        };

        let config = config.with_last_downloaded(target.version());
        inner.persist(&mut slots, config)?;
        slots.pending = Some(target.clone());
        inner.emit(ClientEvent::new_version_ready(target.version()));

        tracing::info!(parent: &inner.span, version = target.version(), "reverting to version");
        Ok(Some(target.version().to_string()))
    }

    /// Never download or adopt `version` again
    pub fn blacklist_version(&self, version: &str) -> HcpResult<()> {
        let inner = &self.inner;
        let mut slots = inner.slots.lock();
        slots.ensure_initialized()?;

        let config = slots.config.clone().with_blacklisted(version);
        inner.persist(&mut slots, config)?;

        if slots.pending.as_deref().is_some_and(|p| p.version() == version) {
            slots.pending = None;
            tracing::info!(parent: &inner.span, version, "dropped blacklisted pending version");
        }
        Ok(())
    }

    pub fn pending_version(&self) -> Option<String> {
        let slots = self.inner.slots.lock();
        slots.pending.as_deref().map(|b| b.version().to_string())
    }

    pub fn current_version(&self) -> Option<String> {
        let slots = self.inner.slots.lock();
        slots.current.as_deref().map(|b| b.version().to_string())
    }

    /// Directory of the bundle that is currently served
    pub fn directory(&self) -> Option<PathBuf> {
        let slots = self.inner.slots.lock();
        slots
            .current
            .as_deref()
            .map(|b| b.directory_path().to_path_buf())
    }

    /// Directory of the bundle the current one was diffed against
    ///
    /// `None` for the initial bundle.
    pub fn parent_directory(&self) -> Option<PathBuf> {
        let slots = self.inner.slots.lock();
        let parent = slots.current.as_deref()?.parent()?;
        slots
            .resolve(parent)
            .map(|b| b.directory_path().to_path_buf())
    }

    pub fn current_bundle(&self) -> Option<Arc<AssetBundle>> {
        self.inner.slots.lock().current.clone()
    }

    pub fn pending_bundle(&self) -> Option<Arc<AssetBundle>> {
        self.inner.slots.lock().pending.clone()
    }

    /// Versions present in the versions directory
    pub fn downloaded_versions(&self) -> Vec<String> {
        let slots = self.inner.slots.lock();
        slots
            .manager
            .as_ref()
            .map(AssetBundleManager::downloaded_versions)
            .unwrap_or_default()
    }

    pub fn state(&self) -> ClientState {
        self.inner.slots.lock().lifecycle
    }

    /// Snapshot of the in-memory configuration record
    pub fn config(&self) -> ClientConfig {
        self.inner.slots.lock().config.clone()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Cancel any running check
    ///
    /// The check discards its partial download and resolves to
    /// [`HcpError::Cancelled`]. No new check makes progress afterwards.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_triggered() {
            tracing::info!(parent: &self.inner.span, "shutting down");
        }
        self.inner.shutdown.trigger();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }
}

impl ClientInner {
    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(parent: &self.span, "event receiver dropped");
        }
    }

    fn report(&self, error: &HcpError) {
        tracing::error!(parent: &self.span, code = error.error_code(), "{error}");
        self.emit(ClientEvent::error(error));
    }

    /// Save `config` and adopt it in memory, or report the failure
    fn persist(&self, slots: &mut ClientSlots, config: ClientConfig) -> HcpResult<()> {
        if let Err(e) = self.store.save(&config) {
            self.report(&e);
            return Err(e);
        }
        slots.config = config;
        Ok(())
    }

    fn evaluate(&self, manifest: &AssetManifest) -> DownloadDecision {
        let (decision, current_compatibility) = {
            let slots = self.slots.lock();
            let decision = slots.decide(&manifest.version, manifest.compatibility_version.as_deref());
            let compatibility = slots
                .current
                .as_deref()
                .and_then(AssetBundle::compatibility_version)
                .map(str::to_string);
            (decision, compatibility)
        };

        match decision {
            DownloadDecision::Blacklisted => {
                self.report(&HcpError::BlacklistedVersion(manifest.version.clone()));
            }
            DownloadDecision::Incompatible => {
                self.report(&HcpError::IncompatibleVersion {
                    version: manifest.version.clone(),
                    current: current_compatibility.unwrap_or_default(),
                    remote: manifest.compatibility_version.clone().unwrap_or_default(),
                });
            }
            _ => {}
        }
        decision
    }

    fn finished_downloading(&self, bundle: Arc<AssetBundle>) -> HcpResult<()> {
        let mut slots = self.slots.lock();
        slots.ensure_initialized()?;

        if slots
            .current
            .as_deref()
            .is_some_and(|c| c.version() == bundle.version())
        {
            tracing::debug!(parent: &self.span, version = bundle.version(), "downloaded version is already current");
            return Ok(());
        }

        // The version may have been blacklisted while it was downloading
        if slots.config.is_blacklisted(bundle.version()) {
            let error = HcpError::BlacklistedVersion(bundle.version().to_string());
            self.report(&error);
            return Err(error);
        }

        let config = slots.config.clone().with_last_downloaded(bundle.version());
        self.persist(&mut slots, config)?;

        if let Some(previous) = slots.pending.replace(bundle.clone())
            && previous.version() != bundle.version()
        {
            tracing::info!(parent: &self.span, previous = previous.version(), "replacing pending version");
        }
        self.emit(ClientEvent::new_version_ready(bundle.version()));

        tracing::info!(parent: &self.span, version = bundle.version(), "new version ready");
        Ok(())
    }

    fn finish_check(&self, result: Result<HcpResult<UpdateCheck>, JoinError>) -> CheckOutcome {
        match result {
            Ok(Ok(UpdateCheck::UpToDate { version })) => CheckOutcome::UpToDate { version },
            Ok(Ok(UpdateCheck::Skipped { version, decision })) => {
                CheckOutcome::Skipped { version, decision }
            }
            Ok(Ok(UpdateCheck::Downloaded(bundle))) => {
                let version = bundle.version().to_string();
                match self.finished_downloading(bundle) {
                    Ok(()) => CheckOutcome::Downloaded { version },
                    Err(HcpError::BlacklistedVersion(_)) => CheckOutcome::Skipped {
                        version,
                        decision: DownloadDecision::Blacklisted,
                    },
                    Err(e) => CheckOutcome::Failed(e),
                }
            }
            Ok(Err(HcpError::Cancelled)) => {
                tracing::info!(parent: &self.span, "update check cancelled");
                CheckOutcome::Failed(HcpError::Cancelled)
            }
            Ok(Err(e)) => {
                self.report(&e);
                CheckOutcome::Failed(e)
            }
            Err(e) if e.is_cancelled() => CheckOutcome::Failed(HcpError::Cancelled),
            Err(e) => {
                let error = HcpError::Internal(format!("update check panicked: {e}"));
                self.report(&error);
                CheckOutcome::Failed(error)
            }
        }
    }

    /// Leave `Checking`/`Downloading` once a check is over
    fn finish_state(&self) {
        let mut slots = self.slots.lock();
        if slots.lifecycle.is_checking() {
            slots.lifecycle = ClientState::Ready;
        }
    }
}

impl DownloadPolicy for ClientInner {
    fn decide(&self, manifest: &AssetManifest) -> DownloadDecision {
        self.evaluate(manifest)
    }

    fn download_started(&self, manifest: &AssetManifest) {
        let mut slots = self.slots.lock();
        if slots.lifecycle == ClientState::Checking
            && slots.transition_to(ClientState::Downloading).is_ok()
        {
            tracing::debug!(parent: &self.span, version = %manifest.version, "downloading");
        }
    }
}

/// Returns the client to `Ready` however the check task ends
struct StateReset(Arc<ClientInner>);

impl Drop for StateReset {
    fn drop(&mut self) {
        self.0.finish_state();
    }
}

/// Aborts the manager task when the client task is dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to one update check
///
/// Dropping the handle lets the check run to completion; [`abort`] stops it
/// and discards any partial download.
///
/// [`abort`]: CheckHandle::abort
#[derive(Debug)]
pub struct CheckHandle {
    state: CheckState,
}

#[derive(Debug)]
enum CheckState {
    Ready(CheckOutcome),
    Running(JoinHandle<CheckOutcome>),
}

impl CheckHandle {
    fn ready(outcome: CheckOutcome) -> Self {
        Self {
            state: CheckState::Ready(outcome),
        }
    }

    fn running(handle: JoinHandle<CheckOutcome>) -> Self {
        Self {
            state: CheckState::Running(handle),
        }
    }

    /// Wait for the check to finish
    pub async fn outcome(self) -> CheckOutcome {
        match self.state {
            CheckState::Ready(outcome) => outcome,
            CheckState::Running(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => CheckOutcome::Failed(HcpError::Cancelled),
                Err(e) => CheckOutcome::Failed(HcpError::Internal(format!(
                    "update check panicked: {e}"
                ))),
            },
        }
    }

    /// Stop the check
    pub fn abort(&self) {
        if let CheckState::Running(handle) = &self.state {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            CheckState::Ready(_) => true,
            CheckState::Running(handle) => handle.is_finished(),
        }
    }
}
