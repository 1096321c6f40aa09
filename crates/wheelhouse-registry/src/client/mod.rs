//! Registry client with caching, statistics and fetch deduplication
//!
//! Query methods degrade rather than fail: a package that cannot be fetched
//! yields `None` or an empty list with a `warn!`, and the caller decides how
//! to proceed. Errors only surface from construction.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::ProjectResponse;
use crate::cache::MetadataCache;
use crate::RegistryResult;
use wheelhouse_core::{PackageMetadata, Version, VersionConstraint, WheelhouseError};

/// How many newest candidates `find_optimal_version` considers
const OPTIMAL_CANDIDATES: usize = 10;

/// Registry client configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL of the PyPI-compatible JSON API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// TTL for cached metadata
    pub cache_ttl: Duration,
    /// Cap on versions considered per package; 0 disables the cap
    pub max_versions_per_package: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pypi.org/pypi".to_string(),
            timeout: Duration::from_secs(15),
            cache_ttl: crate::cache::DEFAULT_TTL,
            max_versions_per_package: 50,
        }
    }
}

/// Fetch statistics, observability only
#[derive(Debug, Default)]
pub struct RegistryStats {
    api_calls: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    versions_checked: AtomicU64,
    versions_pruned: AtomicU64,
}

/// Point-in-time copy of the statistics counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub api_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub versions_checked: u64,
    pub versions_pruned: u64,
}

impl RegistryStats {
    fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_version_checked(&self) {
        self.versions_checked.fetch_add(1, Ordering::Relaxed);
    }

    fn record_versions_pruned(&self, count: u64) {
        self.versions_pruned.fetch_add(count, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            api_calls: self.api_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            versions_checked: self.versions_checked.load(Ordering::Relaxed),
            versions_pruned: self.versions_pruned.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.api_calls.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.versions_checked.store(0, Ordering::Relaxed);
        self.versions_pruned.store(0, Ordering::Relaxed);
    }
}

/// HTTP client for PyPI-compatible registries
#[derive(Debug)]
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
    cache: MetadataCache,
    stats: RegistryStats,
    /// Per-package locks serializing concurrent fetches of the same name
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl RegistryClient {
    /// Create a client with the given configuration
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent("wheelhouse/0.1.0")
            .build()
            .map_err(|e| WheelhouseError::network("Failed to create HTTP client".to_string(), e))?;

        let cache = MetadataCache::with_ttl(config.cache_ttl);

        Ok(Self {
            client,
            config,
            cache,
            stats: RegistryStats::default(),
            in_flight: DashMap::new(),
        })
    }

    /// Fetch statistics for this client
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// The cache backing this client
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Fetch the full project response for a package, cached.
    ///
    /// Concurrent calls for the same name are deduplicated: one caller
    /// performs the HTTP request while the others wait on a per-package
    /// lock and are then served from the cache.
    pub async fn project(&self, name: &str) -> Option<ProjectResponse> {
        if let Some(project) = self.cache.get_project(name) {
            self.stats.record_cache_hit();
            return Some(project);
        }
        self.stats.record_cache_miss();

        let lock = self
            .in_flight
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Losers of the fetch race find the entry the winner inserted
        if let Some(project) = self.cache.get_project(name) {
            return Some(project);
        }

        match self.fetch_project(name).await {
            Ok(project) => {
                self.cache.insert_project(name.to_string(), project.clone());
                Some(project)
            }
            Err(error) => {
                warn!(package = name, %error, "failed to fetch project metadata");
                None
            }
        }
    }

    /// Perform the actual HTTP request for a project
    async fn fetch_project(&self, name: &str) -> RegistryResult<ProjectResponse> {
        self.stats.record_api_call();
        let url = format!("{}/{}/json", self.config.base_url, name);
        debug!(package = name, %url, "fetching project metadata");

        let response = self.client.get(&url).send().await.map_err(|e| {
            WheelhouseError::network(format!("Failed to fetch metadata for '{name}'"), e)
        })?;

        match response.status() {
            StatusCode::OK => response.json::<ProjectResponse>().await.map_err(|e| {
                WheelhouseError::network(format!("Failed to parse metadata for '{name}'"), e)
            }),
            StatusCode::NOT_FOUND => Err(WheelhouseError::PackageNotFound {
                name: name.to_string(),
            }),
            status => Err(WheelhouseError::Network {
                message: format!("Registry returned status {status} for '{name}'"),
                source: None,
            }),
        }
    }

    /// All parseable published versions, ascending.
    ///
    /// Malformed version strings are excluded rather than erroring the run.
    /// When a cap is configured, only the newest `max_versions_per_package`
    /// survive and the rest are counted as pruned.
    pub async fn list_versions(&self, name: &str) -> Vec<Version> {
        let Some(project) = self.project(name).await else {
            return Vec::new();
        };

        let mut versions: Vec<Version> = project
            .releases
            .keys()
            .filter_map(|raw| Version::from_str(raw).ok())
            .collect();
        versions.sort();

        let cap = self.config.max_versions_per_package;
        if cap > 0 && versions.len() > cap {
            let pruned = versions.len() - cap;
            versions.drain(..pruned);
            self.stats.record_versions_pruned(pruned as u64);
            debug!(package = name, pruned, "pruned old versions beyond cap");
        }

        versions
    }

    /// Metadata for one published version, cached per `name:version`
    pub async fn version_metadata(&self, name: &str, version: &str) -> Option<PackageMetadata> {
        if let Some(meta) = self.cache.get_metadata(name, version) {
            return Some(meta);
        }

        let project = self.project(name).await?;
        let meta = project.metadata_for(version)?;
        self.cache.insert_metadata(name, version, meta.clone());
        Some(meta)
    }

    /// Whether a version declares compatibility with the target Python.
    ///
    /// A missing or unparseable `requires_python` never excludes a version.
    /// Verdicts are cached under `name:version:python_version`.
    pub async fn is_python_compatible(
        &self,
        name: &str,
        version: &str,
        python_version: &str,
    ) -> bool {
        if let Some(verdict) = self.cache.get_compatibility(name, version, python_version) {
            self.stats.record_cache_hit();
            return verdict;
        }
        self.stats.record_cache_miss();

        let verdict = match self.version_metadata(name, version).await {
            Some(meta) => python_matches(meta.requires_python.as_deref(), python_version),
            None => false,
        };

        self.cache
            .insert_compatibility(name, version, python_version, verdict);
        verdict
    }

    /// Versions satisfying both the constraint and the target Python,
    /// ascending, at most `max_results` (0 means unlimited).
    ///
    /// Walks the version list newest-first so the scan stops as soon as
    /// enough candidates are found.
    pub async fn find_compatible_versions(
        &self,
        name: &str,
        python_version: &str,
        constraint: &VersionConstraint,
        max_results: usize,
    ) -> Vec<Version> {
        let versions = self.list_versions(name).await;
        let mut compatible = Vec::new();

        for version in versions.iter().rev() {
            if max_results > 0 && compatible.len() >= max_results {
                break;
            }
            self.stats.record_version_checked();
            if !constraint.contains(version) {
                continue;
            }
            if self
                .is_python_compatible(name, &version.to_string(), python_version)
                .await
            {
                compatible.push(version.clone());
            }
        }

        compatible.reverse();
        compatible
    }

    /// Newest compatible version. With `prefer_stable`, pre-releases are
    /// skipped unless no stable candidate exists.
    pub async fn find_optimal_version(
        &self,
        name: &str,
        python_version: &str,
        constraint: &VersionConstraint,
        prefer_stable: bool,
    ) -> Option<Version> {
        let compatible = self
            .find_compatible_versions(name, python_version, constraint, OPTIMAL_CANDIDATES)
            .await;

        if prefer_stable {
            if let Some(stable) = compatible.iter().rev().find(|v| !v.is_prerelease()) {
                return Some(stable.clone());
            }
        }

        compatible.last().cloned()
    }
}

/// Evaluate a `requires_python` range against a target interpreter version.
///
/// Ranges using syntax outside the spec grammar (wildcard exclusions and the
/// like) are treated as compatible rather than silently excluding versions.
fn python_matches(requires: Option<&str>, python_version: &str) -> bool {
    let Some(requires) = requires else {
        return true;
    };
    let requires = requires.trim();
    if requires.is_empty() {
        return true;
    }

    let Ok(target) = Version::from_str(python_version) else {
        return true;
    };

    match VersionConstraint::parse(&format!("python{requires}")) {
        Ok(constraint) => constraint.contains(&target),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests;
