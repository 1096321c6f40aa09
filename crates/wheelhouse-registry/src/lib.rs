//! PyPI registry client for the wheelhouse resolver
//!
//! This crate provides HTTP client functionality for fetching package metadata
//! from a PyPI-compatible JSON API, with TTL caching, fetch statistics, and
//! in-flight request deduplication.

pub mod api;
pub mod cache;
pub mod client;

// Re-export main types
pub use api::{ProjectInfo, ProjectResponse, ReleaseFile};
pub use cache::{CacheStats, MetadataCache};
pub use client::{RegistryClient, RegistryConfig, RegistryStats, StatsSnapshot};

use wheelhouse_core::WheelhouseError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, WheelhouseError>;
