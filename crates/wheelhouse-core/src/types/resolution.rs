//! Resolution output types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::conflict::{Conflict, ConflictResolution};

/// One chosen version per package name.
///
/// Dependencies are stored as names only; the full graph lives in the
/// resolution result's dependency tree, so cycles never hold strong
/// references to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    /// Names of this package's direct dependencies
    pub dependencies: Vec<String>,
    /// Unresolved conflict markers attached to this package
    pub conflicts: Vec<String>,
    /// Whether the user asked for this package directly
    pub direct: bool,
}

impl ResolvedPackage {
    /// Create a resolved package with no dependencies recorded yet
    pub fn new(name: impl Into<String>, version: impl Into<String>, direct: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            direct,
        }
    }
}

/// Complete outcome of one resolution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Exactly one entry per distinct resolved package name
    pub packages: Vec<ResolvedPackage>,
    pub conflicts: Vec<Conflict>,
    /// Audit records for every applied resolution
    pub resolutions: Vec<ConflictResolution>,
    /// Package name to direct dependency names, insertion-ordered
    pub dependency_tree: IndexMap<String, Vec<String>>,
    /// True iff there are no conflicts, or every conflict was resolved
    pub success: bool,
    /// Advisory warnings (degraded fetches, compatibility fallbacks, ...)
    pub warnings: Vec<String>,
}

impl ResolutionResult {
    /// Look up a resolved package by name
    pub fn package(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Recompute the success flag from conflicts and resolution records
    pub fn compute_success(conflicts: &[Conflict], resolutions: &[ConflictResolution]) -> bool {
        conflicts.is_empty()
            || conflicts.iter().all(|conflict| {
                resolutions
                    .iter()
                    .any(|r| r.package_name == conflict.package_name)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::conflict::Severity;
    use uuid::Uuid;

    fn conflict_for(name: &str) -> Conflict {
        Conflict {
            package_name: name.to_string(),
            conflicting_constraints: vec!["==1.0.0".into(), "==2.0.0".into()],
            reason: format!("Conflicting version constraints for {name}"),
            affected_packages: vec![],
            severity: Severity::Medium,
            resolution_suggestions: vec![],
            auto_resolvable: true,
        }
    }

    #[test]
    fn test_success_with_no_conflicts() {
        assert!(ResolutionResult::compute_success(&[], &[]));
    }

    #[test]
    fn test_success_requires_resolution_per_conflict() {
        let conflicts = vec![conflict_for("pkgx")];
        assert!(!ResolutionResult::compute_success(&conflicts, &[]));

        let resolutions = vec![ConflictResolution {
            conflict_id: Uuid::new_v4(),
            package_name: "pkgx".to_string(),
            chosen_version: "2.0.0".to_string(),
            reason: "auto".to_string(),
            strategy_used: crate::types::conflict::StrategyMode::Auto,
            alternatives_considered: vec!["2.0.0".to_string()],
        }];
        assert!(ResolutionResult::compute_success(&conflicts, &resolutions));
    }

    #[test]
    fn test_package_lookup() {
        let result = ResolutionResult {
            packages: vec![ResolvedPackage::new("requests", "2.31.0", true)],
            conflicts: vec![],
            resolutions: vec![],
            dependency_tree: IndexMap::new(),
            success: true,
            warnings: vec![],
        };
        assert!(result.package("requests").is_some());
        assert!(result.package("missing").is_none());
    }
}
