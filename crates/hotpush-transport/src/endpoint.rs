//! Update URL resolution

use crate::{TransportError, TransportResult};
use hotpush_bundle::AssetEntry;
use hotpush_core::ClientSettings;
use url::Url;

/// Where updates live relative to a bundle's root URL
///
/// Both the sub-path and the manifest file name are configurable, so the
/// same client can talk to servers with different layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEndpoint {
    update_path: String,
    manifest_name: String,
}

impl UpdateEndpoint {
    pub fn new(update_path: impl Into<String>, manifest_name: impl Into<String>) -> Self {
        Self {
            update_path: update_path.into(),
            manifest_name: manifest_name.into(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(&settings.update_path, &settings.manifest_name)
    }

    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// Resolve the update directory against a bundle's root URL
    ///
    /// A root without a trailing slash is treated as a directory.
    pub fn update_url(&self, root_url: &str) -> TransportResult<Url> {
        let mut root = Url::parse(root_url).map_err(|e| invalid(root_url, e))?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }

        let mut update_path = self.update_path.trim_start_matches('/').to_string();
        if !update_path.is_empty() && !update_path.ends_with('/') {
            update_path.push('/');
        }

        root.join(&update_path).map_err(|e| invalid(&update_path, e))
    }

    /// URL of the manifest inside an update directory
    pub fn manifest_url(&self, update_url: &Url) -> TransportResult<Url> {
        update_url
            .join(&self.manifest_name)
            .map_err(|e| invalid(&self.manifest_name, e))
    }

    /// URL of one asset inside an update directory
    pub fn asset_url(&self, update_url: &Url, entry: &AssetEntry) -> TransportResult<Url> {
        let relative = entry.url().trim_start_matches('/');
        update_url.join(relative).map_err(|e| invalid(relative, e))
    }
}

fn invalid(url: &str, err: url::ParseError) -> TransportError {
    TransportError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
