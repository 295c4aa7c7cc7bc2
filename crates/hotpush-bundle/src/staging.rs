//! Crash-safe construction of version directories.
//!
//! A new version is assembled under `versions/.staging-<version>-<uuid>` and
//! renamed to `versions/<version>` only after every asset and the manifest are
//! on disk. Staging directories are never loaded as bundles, so an
//! interrupted download is invisible to the next startup.

use crate::{AssetManifest, BundleError, BundleResult, STAGING_PREFIX};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory a new version is written into before it becomes visible.
///
/// Dropping an uncommitted staging directory removes it.
#[derive(Debug)]
pub struct StagingDirectory {
    path: PathBuf,
    version: String,
    committed: bool,
}

impl StagingDirectory {
    /// Create a fresh staging directory for `version` inside `versions_dir`.
    pub fn create(versions_dir: &Path, version: &str) -> BundleResult<Self> {
        let name = format!("{STAGING_PREFIX}{version}-{}", uuid::Uuid::new_v4());
        let path = versions_dir.join(name);
        fs::create_dir_all(&path)?;

        Ok(Self {
            path,
            version: version.to_string(),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Write a downloaded asset.
    pub fn write_asset(&self, relative: &str, contents: &[u8]) -> BundleResult<()> {
        let target = self.prepare(relative)?;
        fs::write(target, contents)?;
        Ok(())
    }

    /// Reuse an unchanged asset from another bundle directory.
    ///
    /// Hard links are tried first; filesystems without link support get a copy.
    pub fn link_asset(&self, source_dir: &Path, relative: &str) -> BundleResult<()> {
        let source = source_dir.join(relative);
        if !source.is_file() {
            return Err(BundleError::MissingFile(source.display().to_string()));
        }

        let target = self.prepare(relative)?;
        if fs::hard_link(&source, &target).is_err() {
            fs::copy(&source, &target)?;
        }
        Ok(())
    }

    /// Write the manifest that makes this directory a loadable bundle.
    ///
    /// Fails if an asset already occupies `manifest_name`.
    pub fn write_manifest(&self, manifest: &AssetManifest, manifest_name: &str) -> BundleResult<()> {
        let target = self.path.join(manifest_name);
        if target.exists() {
            return Err(BundleError::InvalidManifest(format!(
                "asset {manifest_name:?} collides with the manifest file"
            )));
        }
        fs::write(target, manifest.to_json()?)?;
        Ok(())
    }

    /// Move the staging directory to its final location.
    ///
    /// Any directory already at `target` is replaced; callers only commit
    /// over directories that failed to load as a bundle.
    pub fn commit(mut self, target: &Path) -> BundleResult<PathBuf> {
        if target.exists() {
            fs::remove_dir_all(target)?;
        }
        fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(target.to_path_buf())
    }

    fn prepare(&self, relative: &str) -> BundleResult<PathBuf> {
        let target = self.path.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(target)
    }
}

impl Drop for StagingDirectory {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// True for directory names produced by [`StagingDirectory::create`].
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX)
}

/// Remove staging directories left behind by an interrupted process.
///
/// Returns the number of directories removed.
pub fn remove_leftover_staging(versions_dir: &Path) -> BundleResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(versions_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if is_staging_name(&name.to_string_lossy()) && entry.path().is_dir() {
            fs::remove_dir_all(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
