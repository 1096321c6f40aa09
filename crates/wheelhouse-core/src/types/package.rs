//! Package metadata as fetched from the registry.

use serde::{Deserialize, Serialize};

/// Per-version package metadata, immutable once fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,
    /// Concrete version this metadata describes
    pub version: String,
    /// Raw declared dependency strings (may carry extras/markers)
    pub dependencies: Vec<String>,
    /// Declared Python compatibility range; `None` means "any Python"
    pub requires_python: Option<String>,
    /// Whether this release is platform-specific
    pub platform_specific: bool,
    /// Human-readable summary
    pub summary: Option<String>,
}

impl PackageMetadata {
    /// Create metadata with no dependencies or compatibility constraint
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            requires_python: None,
            platform_specific: false,
            summary: None,
        }
    }
}
