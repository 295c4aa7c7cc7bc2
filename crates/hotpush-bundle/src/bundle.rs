//! Immutable on-disk bundles.

use crate::{AssetManifest, BundleError, BundleResult, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};

/// One materialized version of the web application.
///
/// A bundle is a directory plus its parsed manifest. Nothing in this type
/// mutates either; a new version is always a new `AssetBundle`.
///
/// The parent is kept as a version identifier rather than a live reference,
/// so resolving it is up to whoever owns the versions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBundle {
    directory: PathBuf,
    manifest: AssetManifest,
    parent: Option<String>,
}

impl AssetBundle {
    /// Load a bundle using the default manifest file name.
    pub fn load(directory: impl AsRef<Path>) -> BundleResult<Self> {
        Self::load_from(directory, MANIFEST_FILE, None)
    }

    /// Load a bundle with an explicit manifest file name and parent version.
    pub fn load_from(
        directory: impl AsRef<Path>,
        manifest_name: &str,
        parent: Option<String>,
    ) -> BundleResult<Self> {
        let directory = directory.as_ref();
        let manifest_path = directory.join(manifest_name);

        let bytes = match fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BundleError::MissingFile(
                    manifest_path.display().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let manifest = AssetManifest::from_json(&bytes)?;

        Ok(Self {
            directory: directory.to_path_buf(),
            manifest,
            parent,
        })
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn app_id(&self) -> Option<&str> {
        self.manifest.app_id.as_deref()
    }

    pub fn root_url_string(&self) -> Option<&str> {
        self.manifest.root_url.as_deref()
    }

    pub fn compatibility_version(&self) -> Option<&str> {
        self.manifest.compatibility_version.as_deref()
    }

    pub fn directory_path(&self) -> &Path {
        &self.directory
    }

    /// Version this bundle was incrementally built from, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Absolute location of an asset of this bundle.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.directory.join(relative)
    }
}
