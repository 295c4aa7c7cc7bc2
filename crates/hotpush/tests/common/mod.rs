//! Shared fixtures for the hotpush integration tests

#![allow(dead_code)]

use hotpush::hotpush_bundle::MANIFEST_FILE;
use hotpush::{
    AssetManifest, AssetTransport, ClientConfig, ClientEvent, ClientEvents, ClientSettings,
    ConfigStore, HcpClient, MemoryTransport, TaskSpawner,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const ROOT: &str = "https://app.example.com/";

pub const V1: &[(&str, &str)] = &[("app.js", "console.log(1)"), ("vendor.js", "lib()")];
pub const V2: &[(&str, &str)] = &[("app.js", "console.log(2)"), ("vendor.js", "lib()")];

pub fn manifest(version: &str, root: &str, assets: &[(&str, &str)]) -> AssetManifest {
    let mut manifest = AssetManifest::new(version)
        .with_app_id("demo")
        .with_root_url(root)
        .with_compatibility_version("cordova-1");
    for (path, contents) in assets {
        manifest = manifest.with_asset(*path, contents.as_bytes());
    }
    manifest
}

pub fn write_bundle(dir: &Path, manifest: &AssetManifest, assets: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (path, contents) in assets {
        fs::write(dir.join(path), contents).unwrap();
    }
    fs::write(dir.join(MANIFEST_FILE), manifest.to_json().unwrap()).unwrap();
}

/// Serve a version the way the update server lays it out
pub fn serve(transport: &MemoryTransport, root: &str, manifest: &AssetManifest, assets: &[(&str, &str)]) {
    let update = format!("{root}__cordova/");
    transport.insert(format!("{update}{MANIFEST_FILE}"), manifest.to_json().unwrap());
    for (path, contents) in assets {
        transport.insert(format!("{update}{path}"), contents.to_string());
    }
}

/// One installation of the host app: initial bundle plus data directory
pub struct Install {
    pub dir: TempDir,
}

impl Install {
    pub fn new(root: &str) -> Self {
        let install = Self {
            dir: TempDir::new().unwrap(),
        };
        write_bundle(&install.initial_dir(), &manifest("1", root, V1), V1);
        install
    }

    pub fn initial_dir(&self) -> PathBuf {
        self.dir.path().join("www")
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings::new(self.dir.path().join("data"), self.initial_dir())
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.settings().versions_dir()
    }

    pub fn stored_config(&self) -> ClientConfig {
        ConfigStore::new(self.settings().config_path()).load().unwrap()
    }

    /// Start the client as the host does on app launch
    pub fn launch(&self, transport: Arc<dyn AssetTransport>) -> (HcpClient, ClientEvents) {
        let (client, events) = HcpClient::new(self.settings(), transport, TaskSpawner::current());
        client.init().unwrap();
        (client, events)
    }
}

pub fn drain(events: &mut ClientEvents) -> Vec<ClientEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

pub fn error_messages(events: &[ClientEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Error { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Every file below `dir` with its contents, keyed by relative path
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(base: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(base, &path, files);
        } else {
            let relative = path.strip_prefix(base).unwrap().to_string_lossy().to_string();
            files.insert(relative, fs::read(&path).unwrap());
        }
    }
}

pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
