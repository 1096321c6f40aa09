//! # wheelhouse-core
//!
//! Core types and utilities shared across all wheelhouse crates.
//!
//! This crate provides:
//! - Version and VersionConstraint types for PyPI-style version algebra
//! - Environment, Conflict and ResolutionResult types for resolution runs
//! - WheelhouseError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, VersionConstraint, Conflict, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{WheelhouseError, WheelhouseResult};
pub use types::{
    Clause, CompareOp, Conflict, ConflictResolution, ConflictStrategy, Environment,
    PackageMetadata, ResolutionResult, ResolvedPackage, Severity, SpecError, StrategyMode,
    Version, VersionConstraint, VersionError,
};
