//! Core data types for wheelhouse dependency resolution.
//!
//! This module provides the fundamental types used throughout the wheelhouse
//! crates:
//! - Version types with PyPI-style pre-release ordering
//! - Version constraints (comparison clause sets) and the spec grammar
//! - Environment, conflict and resolution result structures

pub mod conflict;
pub mod constraint;
pub mod environment;
pub mod package;
pub mod resolution;
pub mod version;

// Re-export all public types
pub use conflict::{Conflict, ConflictResolution, ConflictStrategy, Severity, StrategyMode};
pub use constraint::{Clause, CompareOp, SpecError, VersionConstraint};
pub use environment::Environment;
pub use package::PackageMetadata;
pub use resolution::{ResolutionResult, ResolvedPackage};
pub use version::{PreRelease, Version, VersionError};
