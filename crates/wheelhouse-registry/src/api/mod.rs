//! PyPI JSON API response types
//!
//! Shapes returned by `GET {base}/{package}/json`. Every field beyond the
//! package name is optional in practice, so deserialization is tolerant of
//! missing keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use wheelhouse_core::PackageMetadata;

/// Top-level project response from the registry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectResponse {
    /// Metadata for the latest release
    pub info: ProjectInfo,
    /// All published releases, keyed by version string
    #[serde(default)]
    pub releases: HashMap<String, Vec<ReleaseFile>>,
}

/// Project-level metadata describing the latest release
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectInfo {
    /// Package name
    pub name: String,
    /// Latest published version
    pub version: String,
    /// Short description
    #[serde(default)]
    pub summary: Option<String>,
    /// Declared Python compatibility range for the latest release
    #[serde(default)]
    pub requires_python: Option<String>,
    /// Raw dependency strings for the latest release
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
}

/// One distributed file within a release
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReleaseFile {
    /// Declared Python compatibility range
    #[serde(default)]
    pub requires_python: Option<String>,
    /// Raw dependency strings, when the registry exposes them per-file
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
    /// Target platform tag; absent or `any` means platform-independent
    #[serde(default)]
    pub platform: Option<String>,
    /// Short description
    #[serde(default)]
    pub summary: Option<String>,
    /// Whether this file has been yanked from the index
    #[serde(default)]
    pub yanked: bool,
}

impl ProjectResponse {
    /// Build per-version metadata for one release in this project.
    ///
    /// The registry only carries full metadata for the latest release in
    /// `info`; older releases fall back to whatever their release files
    /// declare. Returns `None` when the version is not published.
    pub fn metadata_for(&self, version: &str) -> Option<PackageMetadata> {
        let files = self.releases.get(version)?;

        let mut meta = PackageMetadata::new(self.info.name.clone(), version);
        if version == self.info.version {
            meta.dependencies = self.info.requires_dist.clone().unwrap_or_default();
            meta.requires_python = self.info.requires_python.clone();
            meta.summary = self.info.summary.clone();
        } else if let Some(file) = files.iter().find(|f| f.requires_dist.is_some()) {
            meta.dependencies = file.requires_dist.clone().unwrap_or_default();
            meta.requires_python = file.requires_python.clone();
            meta.summary = file.summary.clone();
        } else if let Some(file) = files.first() {
            meta.requires_python = file.requires_python.clone();
            meta.summary = file.summary.clone();
        }

        meta.platform_specific = files
            .iter()
            .any(|f| f.platform.as_deref().is_some_and(|p| p != "any"));

        Some(meta)
    }
}
