//! Dependency resolution engine for wheelhouse
//!
//! This crate walks the dependency closure of a set of package
//! specifications against a PyPI-compatible registry, then detects and
//! (optionally) repairs version conflicts in a separate pass.

pub mod conflict;
pub mod engine;

// Re-export main types
pub use conflict::ConflictDetector;
pub use engine::{Resolver, ResolverOptions};

use wheelhouse_core::WheelhouseError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, WheelhouseError>;
