//! Fixtures shared by the unit tests of this crate

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use bytes::Bytes;
use hotpush_bundle::{AssetManifest, MANIFEST_FILE};
use hotpush_transport::{AssetTransport, MemoryTransport, TransportError, TransportResult, Url};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

pub(crate) const ROOT: &str = "https://example.com/";
pub(crate) const UPDATE_URL: &str = "https://example.com/__cordova/";

pub(crate) const V1_ASSETS: &[(&str, &str)] = &[("app.js", "app v1"), ("vendor.js", "vendor")];
pub(crate) const V2_ASSETS: &[(&str, &str)] = &[("app.js", "app v2"), ("vendor.js", "vendor")];

pub(crate) fn manifest(version: &str, assets: &[(&str, &str)]) -> AssetManifest {
    let mut manifest = AssetManifest::new(version)
        .with_app_id("app")
        .with_root_url(ROOT)
        .with_compatibility_version("1");
    for (path, contents) in assets {
        manifest = manifest.with_asset(*path, contents.as_bytes());
    }
    manifest
}

/// Lay out a complete bundle directory
pub(crate) fn write_bundle(dir: &Path, manifest: &AssetManifest, assets: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (path, contents) in assets {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, contents).unwrap();
    }
    fs::write(dir.join(MANIFEST_FILE), manifest.to_json().unwrap()).unwrap();
}

/// Serve a version under the default update directory
pub(crate) fn serve(transport: &MemoryTransport, manifest: &AssetManifest, assets: &[(&str, &str)]) {
    transport.insert(
        format!("{UPDATE_URL}{MANIFEST_FILE}"),
        manifest.to_json().unwrap(),
    );
    for (path, contents) in assets {
        transport.insert(format!("{UPDATE_URL}{path}"), contents.to_string());
    }
}

pub(crate) fn update_url() -> Url {
    Url::parse(UPDATE_URL).unwrap()
}

/// Sorted names inside a directory
pub(crate) fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Memory transport that holds one URL until the gate opens
pub(crate) struct GatedTransport {
    pub(crate) inner: MemoryTransport,
    gated: String,
    gate: Semaphore,
    entered: AtomicBool,
}

impl GatedTransport {
    pub(crate) fn new(gated: impl Into<String>) -> Self {
        Self {
            inner: MemoryTransport::new(),
            gated: gated.into(),
            gate: Semaphore::new(0),
            entered: AtomicBool::new(false),
        }
    }

    pub(crate) fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// Wait until a request for the gated URL is parked
    pub(crate) async fn wait_entered(&self) {
        for _ in 0..500 {
            if self.entered.load(Ordering::Acquire) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("gated url {} was never requested", self.gated);
    }
}

#[async_trait]
impl AssetTransport for GatedTransport {
    async fn fetch(&self, url: &Url) -> TransportResult<Bytes> {
        if url.as_str() == self.gated {
            self.entered.store(true, Ordering::Release);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| TransportError::Cancelled)?;
        }
        self.inner.fetch(url).await
    }
}
