//! Versions directory ownership and incremental downloads

use hotpush_bundle::{
    AssetBundle, AssetEntry, AssetManifest, ManifestDiff, StagingDirectory, is_staging_name,
    remove_leftover_staging,
};
use hotpush_core::{DownloadDecision, HcpError, HcpResult};
use hotpush_logging::component_span;
use hotpush_runtime::{ShutdownSignal, TaskSpawner};
use hotpush_transport::{AssetTransport, Bytes, TransportError, UpdateEndpoint, Url};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

/// Largest manifest a server may return
const MANIFEST_SIZE_LIMIT: u64 = 16 * 1024 * 1024;

/// Decides whether a remote version is worth downloading
///
/// Consulted once per check, after the manifest is fetched and before any
/// asset is transferred.
pub trait DownloadPolicy: Send + Sync {
    fn decide(&self, manifest: &AssetManifest) -> DownloadDecision;

    /// Called once an accepted version starts materializing
    fn download_started(&self, _manifest: &AssetManifest) {}
}

/// Successful result of one manager check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    /// The remote version is the reference version
    UpToDate { version: String },
    /// The policy rejected the remote version
    Skipped {
        version: String,
        decision: DownloadDecision,
    },
    /// A complete, verified bundle now exists under the versions directory
    Downloaded(Arc<AssetBundle>),
}

/// Where the manager keeps versions and how it reaches the server
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub versions_dir: PathBuf,
    pub manifest_name: String,
    pub endpoint: UpdateEndpoint,
}

/// Owns the versions directory and turns update checks into bundles
///
/// At most one check runs at a time; a second request is rejected with
/// [`HcpError::CheckInProgress`] before anything is spawned.
#[derive(Clone)]
pub struct AssetBundleManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: ManagerConfig,
    transport: Arc<dyn AssetTransport>,
    spawner: TaskSpawner,
    shutdown: ShutdownSignal,
    in_flight: AtomicBool,
    downloaded: Mutex<HashMap<String, Arc<AssetBundle>>>,
    span: Span,
}

/// Releases the in-flight flag when a check ends or is dropped
struct InFlightGuard(Arc<ManagerInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl AssetBundleManager {
    /// Open the versions directory
    ///
    /// Leftover staging directories are removed. Every other subdirectory
    /// that holds a valid manifest for its own name becomes a known bundle
    /// whose parent is `initial_version`; anything else is ignored.
    pub fn new(
        config: ManagerConfig,
        transport: Arc<dyn AssetTransport>,
        spawner: TaskSpawner,
        shutdown: ShutdownSignal,
        initial_version: &str,
    ) -> HcpResult<Self> {
        let span = component_span("AssetBundleManager");
        let versions_dir = &config.versions_dir;

        fs::create_dir_all(versions_dir).map_err(|e| HcpError::storage_init(versions_dir, e))?;

        match remove_leftover_staging(versions_dir) {
            Ok(0) => {}
            Ok(removed) => {
                tracing::info!(parent: &span, removed, "removed interrupted downloads");
            }
            Err(e) => {
                tracing::warn!(parent: &span, "cannot clean staging directories: {e}");
            }
        }

        let downloaded = scan_versions(versions_dir, &config.manifest_name, initial_version, &span)
            .map_err(|e| HcpError::storage_init(versions_dir, e))?;
        tracing::debug!(parent: &span, count = downloaded.len(), "loaded downloaded versions");

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                transport,
                spawner,
                shutdown,
                in_flight: AtomicBool::new(false),
                downloaded: Mutex::new(downloaded),
                span,
            }),
        })
    }

    pub fn versions_dir(&self) -> &Path {
        &self.inner.config.versions_dir
    }

    /// A fully downloaded version, if present
    pub fn downloaded_bundle(&self, version: &str) -> Option<Arc<AssetBundle>> {
        self.inner.downloaded.lock().get(version).cloned()
    }

    /// Versions available in the versions directory, sorted
    pub fn downloaded_versions(&self) -> Vec<String> {
        let mut versions: Vec<_> = self.inner.downloaded.lock().keys().cloned().collect();
        versions.sort();
        versions
    }

    pub fn is_checking(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Start a check against `reference`
    ///
    /// Returns immediately; the spawned task resolves to the check result.
    /// Failures inside the task are returned as `Err`, never panics.
    pub fn check_for_updates(
        &self,
        update_url: Url,
        reference: Arc<AssetBundle>,
        policy: Arc<dyn DownloadPolicy>,
    ) -> HcpResult<JoinHandle<HcpResult<UpdateCheck>>> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(HcpError::CheckInProgress);
        }
        let guard = InFlightGuard(self.inner.clone());

        let inner = self.inner.clone();
        let span = tracing::debug_span!(parent: &self.inner.span, "check", %update_url);
        Ok(self.inner.spawner.spawn(
            async move {
                let _guard = guard;
                inner.run_check(update_url, reference, policy).await
            }
            .instrument(span),
        ))
    }
}

impl ManagerInner {
    async fn run_check(
        &self,
        update_url: Url,
        reference: Arc<AssetBundle>,
        policy: Arc<dyn DownloadPolicy>,
    ) -> HcpResult<UpdateCheck> {
        let manifest_url = self.config.endpoint.manifest_url(&update_url)?;
        let body = self.fetch(&manifest_url).await?;
        let manifest = AssetManifest::from_json(&body)
            .map_err(|e| HcpError::ManifestParse(format!("{manifest_url}: {e}")))?;
        let version = manifest.version.clone();

        if manifest.entry(&self.config.manifest_name).is_some() {
            return Err(HcpError::ManifestParse(format!(
                "{manifest_url}: asset {:?} collides with the manifest file",
                self.config.manifest_name
            )));
        }

        if version == reference.version() {
            tracing::info!(parent: &self.span, %version, "no new version available");
            return Ok(UpdateCheck::UpToDate { version });
        }

        let decision = policy.decide(&manifest);
        if !decision.is_accept() {
            tracing::info!(parent: &self.span, %version, "skipping version: {decision}");
            return Ok(UpdateCheck::Skipped { version, decision });
        }

        let existing = self.downloaded.lock().get(&version).cloned();
        if let Some(existing) = existing {
            tracing::info!(parent: &self.span, %version, "version already downloaded");
            return Ok(UpdateCheck::Downloaded(existing));
        }

        policy.download_started(&manifest);
        let bundle = self.download(&update_url, &manifest, &reference).await?;
        let bundle = Arc::new(bundle);
        self.downloaded
            .lock()
            .insert(version.clone(), bundle.clone());

        tracing::info!(parent: &self.span, %version, "finished downloading new version");
        Ok(UpdateCheck::Downloaded(bundle))
    }

    /// Materialize `manifest` next to the existing versions
    ///
    /// Nothing becomes visible under `versions/<version>` unless every asset
    /// was written and verified; the staging directory is removed on any
    /// early return or cancellation. Disk work runs on the blocking pool.
    async fn download(
        &self,
        update_url: &Url,
        manifest: &AssetManifest,
        reference: &AssetBundle,
    ) -> HcpResult<AssetBundle> {
        let diff = manifest.diff_against(reference.manifest());
        tracing::info!(
            parent: &self.span,
            version = %manifest.version,
            reused = diff.reused.len(),
            download = diff.download.len(),
            bytes = diff.download_bytes(),
            "downloading version"
        );

        let versions_dir = self.config.versions_dir.clone();
        let version = manifest.version.clone();
        let source_dir = reference.directory_path().to_path_buf();
        let span = self.span.clone();
        let ManifestDiff { reused, download, .. } = diff;
        let download_len = download.len();

        let (staging, mut queue) = self
            .blocking(move || {
                let staging = StagingDirectory::create(&versions_dir, &version)?;
                let mut queue = Vec::with_capacity(download_len);
                for entry in reused {
                    if let Err(e) = staging.link_asset(&source_dir, &entry.path) {
                        tracing::debug!(parent: &span, path = %entry.path, "cannot reuse asset, downloading: {e}");
                        queue.push(entry);
                    }
                }
                Ok((staging, queue))
            })
            .await?;
        queue.extend(download);

        let mut guard = StagingGuard::new(staging, self.spawner.clone());
        if let Err(e) = self.store_assets(update_url, queue, &mut guard).await {
            guard.discard().await;
            return Err(e);
        }

        let staging = guard.take()?;
        let manifest = manifest.clone();
        let manifest_name = self.config.manifest_name.clone();
        let target = self.config.versions_dir.join(&manifest.version);
        let parent = reference.version().to_string();
        self.blocking(move || {
            staging.write_manifest(&manifest, &manifest_name)?;
            let target = staging.commit(&target)?;
            Ok(AssetBundle::load_from(target, &manifest_name, Some(parent))?)
        })
        .await
    }

    async fn store_assets(
        &self,
        update_url: &Url,
        queue: Vec<AssetEntry>,
        guard: &mut StagingGuard,
    ) -> HcpResult<()> {
        for entry in queue {
            if self.shutdown.is_triggered() {
                return Err(HcpError::Cancelled);
            }

            let url = self.config.endpoint.asset_url(update_url, &entry)?;
            let contents = self.fetch_asset(&url, &entry).await?;

            let staging = guard.take()?;
            let path = entry.path.clone();
            let staging = self
                .blocking(move || {
                    entry.verify(&contents)?;
                    staging.write_asset(&entry.path, &contents)?;
                    Ok(staging)
                })
                .await?;
            guard.restore(staging);
            tracing::trace!(parent: &self.span, %path, "asset stored");
        }
        Ok(())
    }

    /// Run disk work on the blocking pool
    async fn blocking<T, F>(&self, func: F) -> HcpResult<T>
    where
        F: FnOnce() -> HcpResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.spawner
            .spawn_blocking(func)
            .await
            .map_err(|e| HcpError::Internal(format!("blocking task failed: {e}")))?
    }

    async fn fetch(&self, url: &Url) -> HcpResult<Bytes> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(HcpError::Cancelled),
            result = self.transport.fetch_limited(url, MANIFEST_SIZE_LIMIT) => result.map_err(fetch_error),
        }
    }

    /// Fetch one asset, reading no more than its declared size
    async fn fetch_asset(&self, url: &Url, entry: &AssetEntry) -> HcpResult<Bytes> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(HcpError::Cancelled),
            result = self.transport.fetch_limited(url, entry.size) => result.map_err(|e| match e {
                TransportError::TooLarge { limit, .. } => HcpError::AssetVerification {
                    path: entry.path.clone(),
                    reason: format!("expected {limit} bytes, got more"),
                },
                other => fetch_error(other),
            }),
        }
    }
}

fn fetch_error(err: TransportError) -> HcpError {
    match err {
        TransportError::Cancelled => HcpError::Cancelled,
        other => HcpError::ManifestFetch(other.to_string()),
    }
}

/// Holds the staging directory between blocking steps
///
/// Dropping it with a directory still inside, as happens when the check is
/// aborted, removes that directory on the blocking pool.
struct StagingGuard {
    staging: Option<StagingDirectory>,
    spawner: TaskSpawner,
}

impl StagingGuard {
    fn new(staging: StagingDirectory, spawner: TaskSpawner) -> Self {
        Self {
            staging: Some(staging),
            spawner,
        }
    }

    fn take(&mut self) -> HcpResult<StagingDirectory> {
        self.staging
            .take()
            .ok_or_else(|| HcpError::Internal("staging directory already released".to_string()))
    }

    fn restore(&mut self, staging: StagingDirectory) {
        self.staging = Some(staging);
    }

    /// Remove the staging directory and wait until it is gone
    async fn discard(mut self) {
        if let Some(staging) = self.staging.take() {
            let _ = self.spawner.spawn_blocking(move || drop(staging)).await;
        }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Some(staging) = self.staging.take() {
            drop(self.spawner.spawn_blocking(move || drop(staging)));
        }
    }
}

fn scan_versions(
    versions_dir: &Path,
    manifest_name: &str,
    initial_version: &str,
    span: &Span,
) -> std::io::Result<HashMap<String, Arc<AssetBundle>>> {
    let mut downloaded = HashMap::new();

    for entry in fs::read_dir(versions_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_staging_name(&name) || !entry.path().is_dir() {
            continue;
        }

        match AssetBundle::load_from(entry.path(), manifest_name, Some(initial_version.to_string()))
        {
            Ok(bundle) if bundle.version() == name => {
                downloaded.insert(name, Arc::new(bundle));
            }
            Ok(bundle) => {
                tracing::warn!(parent: span, directory = %name, version = bundle.version(), "ignoring version directory with mismatched manifest");
            }
            Err(e) => {
                tracing::warn!(parent: span, directory = %name, "ignoring invalid version directory: {e}");
            }
        }
    }

    Ok(downloaded)
}
