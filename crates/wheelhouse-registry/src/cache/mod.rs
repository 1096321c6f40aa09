//! Metadata caching with TTL support
//!
//! Three logically separate caches share one TTL: whole project responses
//! keyed by package name, per-version metadata keyed by `name:version`, and
//! Python-compatibility checks keyed by `name:version:python_version`.
//! The cache is instance-owned state injected into the client, never a
//! process-wide global.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::api::ProjectResponse;
use wheelhouse_core::PackageMetadata;

/// Default time-to-live for all cached entries (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached value stamped with its insertion time
#[derive(Debug, Clone)]
struct Stamped<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Stamped<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// In-memory registry cache with TTL
#[derive(Debug)]
pub struct MetadataCache {
    ttl: Duration,
    projects: DashMap<String, Stamped<ProjectResponse>>,
    metadata: DashMap<String, Stamped<PackageMetadata>>,
    compatibility: DashMap<String, Stamped<bool>>,
}

impl MetadataCache {
    /// Create a cache with the default TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            projects: DashMap::new(),
            metadata: DashMap::new(),
            compatibility: DashMap::new(),
        }
    }

    /// Composite key for per-version metadata entries
    pub fn metadata_key(name: &str, version: &str) -> String {
        format!("{name}:{version}")
    }

    /// Composite key for compatibility entries
    pub fn compatibility_key(name: &str, version: &str, python_version: &str) -> String {
        format!("{name}:{version}:{python_version}")
    }

    /// Get a cached project response if still fresh
    pub fn get_project(&self, name: &str) -> Option<ProjectResponse> {
        read_fresh(&self.projects, name, self.ttl)
    }

    /// Store a project response
    pub fn insert_project(&self, name: String, project: ProjectResponse) {
        self.projects.insert(name, Stamped::new(project));
    }

    /// Get cached per-version metadata if still fresh
    pub fn get_metadata(&self, name: &str, version: &str) -> Option<PackageMetadata> {
        read_fresh(&self.metadata, &Self::metadata_key(name, version), self.ttl)
    }

    /// Store per-version metadata
    pub fn insert_metadata(&self, name: &str, version: &str, metadata: PackageMetadata) {
        self.metadata
            .insert(Self::metadata_key(name, version), Stamped::new(metadata));
    }

    /// Get a cached compatibility verdict if still fresh
    pub fn get_compatibility(&self, name: &str, version: &str, python_version: &str) -> Option<bool> {
        read_fresh(
            &self.compatibility,
            &Self::compatibility_key(name, version, python_version),
            self.ttl,
        )
    }

    /// Store a compatibility verdict
    pub fn insert_compatibility(
        &self,
        name: &str,
        version: &str,
        python_version: &str,
        compatible: bool,
    ) {
        self.compatibility.insert(
            Self::compatibility_key(name, version, python_version),
            Stamped::new(compatible),
        );
    }

    /// Drop every entry from all three caches
    pub fn clear(&self) {
        self.projects.clear();
        self.metadata.clear();
        self.compatibility.clear();
    }

    /// Snapshot of entry counts per cache
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            project_entries: self.projects.len(),
            metadata_entries: self.metadata.len(),
            compatibility_entries: self.compatibility.len(),
        }
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a fresh entry, evicting it when stale
fn read_fresh<T: Clone>(map: &DashMap<String, Stamped<T>>, key: &str, ttl: Duration) -> Option<T> {
    let fresh = {
        let entry = map.get(key)?;
        if entry.is_fresh(ttl) {
            Some(entry.value.clone())
        } else {
            None
        }
    };
    if fresh.is_none() {
        map.remove(key);
    }
    fresh
}

/// Cache entry counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached project responses
    pub project_entries: usize,
    /// Cached per-version metadata entries
    pub metadata_entries: usize,
    /// Cached compatibility verdicts
    pub compatibility_entries: usize,
}
