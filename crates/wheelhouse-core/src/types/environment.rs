//! Target environment description.

use serde::{Deserialize, Serialize};

/// Immutable description of the environment a resolution targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Target Python version (e.g. `3.9` or `3.11.4`)
    pub python_version: String,
    /// Target platform (`linux`, `windows`, `macos`, `any`)
    pub platform: String,
    /// Target implementation (`cpython`, `pypy`, ...)
    pub implementation: String,
    /// Target architecture, when it matters
    pub architecture: Option<String>,
}

impl Environment {
    /// Environment for a Python version with default platform/implementation
    pub fn new(python_version: impl Into<String>) -> Self {
        Self {
            python_version: python_version.into(),
            platform: "any".to_string(),
            implementation: "cpython".to_string(),
            architecture: None,
        }
    }

    /// Set the target platform
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("3.9")
    }
}
