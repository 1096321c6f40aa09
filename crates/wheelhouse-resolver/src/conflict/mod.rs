//! Conflict detection and resolution
//!
//! Detection runs after dependency expansion: for every package name with
//! more than one recorded constraint, the constraints are intersected and
//! checked against the real published version list. Resolution then applies
//! the configured strategy to each reported conflict.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use wheelhouse_core::{
    Conflict, ConflictResolution, ConflictStrategy, Environment, ResolutionResult,
    ResolvedPackage, Severity, StrategyMode, Version, VersionConstraint, WheelhouseError,
};
use wheelhouse_registry::RegistryClient;

use crate::engine::ResolutionState;
use crate::ResolverResult;

/// Detects and repairs version conflicts against a registry
#[derive(Debug)]
pub struct ConflictDetector {
    registry: Arc<RegistryClient>,
}

impl ConflictDetector {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self { registry }
    }

    /// Report every package whose combined constraints no published version
    /// satisfies. Also marks the affected resolved packages.
    pub(crate) async fn detect(&self, state: &mut ResolutionState) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for (name, constraints) in &state.constraints {
            if constraints.len() < 2 {
                continue;
            }

            let merged = constraints
                .iter()
                .skip(1)
                .fold(constraints[0].clone(), |acc, c| acc.intersect(c));
            if merged.is_unconstrained() {
                continue;
            }

            let versions = self.registry.list_versions(name).await;
            if merged.is_satisfiable_against(&versions) {
                continue;
            }

            let affected = state.dependents.get(name).cloned().unwrap_or_default();
            let severity = Severity::from_dependents(affected.len());

            let conflicting: Vec<String> =
                constraints.iter().map(|c| c.clauses_display()).collect();

            let mut suggestions = Vec::new();
            if let Some(package) = state.packages.get(name) {
                suggestions.push(format!("Keep the currently selected version {}", package.version));
            }
            for constraint in constraints {
                suggestions.push(format!("Relax the requirement '{constraint}'"));
            }

            debug!(package = %name, constraints = ?conflicting, "constraint conflict detected");

            conflicts.push(Conflict {
                package_name: name.clone(),
                conflicting_constraints: conflicting.clone(),
                reason: format!(
                    "No published version of '{name}' satisfies {}",
                    conflicting.join(" and ")
                ),
                affected_packages: affected,
                severity,
                resolution_suggestions: suggestions,
                auto_resolvable: true,
            });
        }

        for conflict in &conflicts {
            if let Some(package) = state.packages.get_mut(&conflict.package_name) {
                package.conflicts = conflict.conflicting_constraints.clone();
            }
        }

        conflicts
    }

    /// Apply the configured strategy to the reported conflicts.
    ///
    /// `Fail` aborts the run; `Ignore` and `Manual` leave the resolution
    /// untouched (manual consumers act on the suggestions carried by the
    /// conflicts themselves); `Auto` attempts a repair per conflict.
    pub(crate) async fn resolve(
        &self,
        conflicts: &[Conflict],
        state: &mut ResolutionState,
        strategy: &ConflictStrategy,
        environment: &Environment,
    ) -> ResolverResult<Vec<ConflictResolution>> {
        if conflicts.is_empty() {
            return Ok(Vec::new());
        }

        match strategy.mode {
            StrategyMode::Fail => Err(WheelhouseError::ConflictsDetected {
                count: conflicts.len(),
            }),
            StrategyMode::Ignore | StrategyMode::Manual => Ok(Vec::new()),
            StrategyMode::Auto => {
                self.auto_resolve(conflicts, state, strategy, environment)
                    .await
            }
        }
    }

    /// Greedy repair: walk candidate versions and pick the first satisfying
    /// every recorded constraint, falling back to the best candidate when
    /// none does. No backtracking across packages.
    async fn auto_resolve(
        &self,
        conflicts: &[Conflict],
        state: &mut ResolutionState,
        strategy: &ConflictStrategy,
        environment: &Environment,
    ) -> ResolverResult<Vec<ConflictResolution>> {
        let mut resolutions = Vec::new();

        for conflict in conflicts {
            if !conflict.auto_resolvable {
                continue;
            }
            let name = &conflict.package_name;
            let constraints = state.constraints.get(name).cloned().unwrap_or_default();
            let current = state
                .packages
                .get(name)
                .and_then(|p| Version::from_str(&p.version).ok());

            let compatible = self
                .registry
                .find_compatible_versions(
                    name,
                    &environment.python_version,
                    &VersionConstraint::unconstrained(name),
                    0,
                )
                .await;
            let candidates = order_candidates(compatible, strategy, current.as_ref());

            if candidates.is_empty() {
                debug!(package = %name, "no candidates available for automatic repair");
                continue;
            }

            let considered: Vec<String> = candidates.iter().map(|v| v.to_string()).collect();
            let satisfying = candidates
                .iter()
                .find(|v| constraints.iter().all(|c| c.contains(v)));

            let (chosen, reason) = match satisfying {
                Some(version) => (
                    version.clone(),
                    format!("Version {version} satisfies every recorded constraint"),
                ),
                None => {
                    let version = candidates[0].clone();
                    (
                        version.clone(),
                        format!(
                            "No version satisfies all constraints; best-effort pick of {version}"
                        ),
                    )
                }
            };

            let chosen_str = chosen.to_string();
            if let Some(package) = state.packages.get_mut(name) {
                package.version = chosen_str.clone();
                package.conflicts.clear();
            } else {
                state.packages.insert(
                    name.clone(),
                    ResolvedPackage::new(name.clone(), chosen_str.clone(), false),
                );
            }

            info!(package = %name, version = %chosen_str, "conflict auto-resolved");

            resolutions.push(ConflictResolution {
                conflict_id: Uuid::new_v4(),
                package_name: name.clone(),
                chosen_version: chosen_str,
                reason,
                strategy_used: StrategyMode::Auto,
                alternatives_considered: considered,
            });
        }

        Ok(resolutions)
    }

    /// Apply an externally chosen resolution to a finished result.
    ///
    /// Callers running the manual strategy pick a version from a reported
    /// conflict's suggestions and feed the decision back through here: the
    /// package version is overwritten, its conflict markers cleared, the
    /// audit record appended, and the success flag recomputed.
    pub fn apply_resolution(result: &mut ResolutionResult, resolution: ConflictResolution) {
        if let Some(package) = result
            .packages
            .iter_mut()
            .find(|p| p.name == resolution.package_name)
        {
            package.version = resolution.chosen_version.clone();
            package.conflicts.clear();
        } else {
            result.packages.push(ResolvedPackage::new(
                resolution.package_name.clone(),
                resolution.chosen_version.clone(),
                false,
            ));
            result
                .dependency_tree
                .insert(resolution.package_name.clone(), Vec::new());
        }

        info!(
            package = %resolution.package_name,
            version = %resolution.chosen_version,
            "applied external resolution"
        );

        result.resolutions.push(resolution);
        result.success = ResolutionResult::compute_success(&result.conflicts, &result.resolutions);
    }
}

/// Order and filter repair candidates per the strategy.
///
/// Input is ascending (registry order). Stable releases are preferred when
/// requested, the walk order follows `prefer_latest`, downgrades below the
/// currently selected version are dropped unless allowed, and the walk is
/// capped at `max_attempts` (0 means unbounded).
fn order_candidates(
    mut candidates: Vec<Version>,
    strategy: &ConflictStrategy,
    current: Option<&Version>,
) -> Vec<Version> {
    if strategy.prefer_stable {
        let stable: Vec<Version> = candidates
            .iter()
            .filter(|v| !v.is_prerelease())
            .cloned()
            .collect();
        if !stable.is_empty() {
            candidates = stable;
        }
    }

    if !strategy.allow_downgrade {
        if let Some(current) = current {
            candidates.retain(|v| v >= current);
        }
    }

    if strategy.prefer_latest {
        candidates.reverse();
    }

    if strategy.max_attempts > 0 {
        candidates.truncate(strategy.max_attempts);
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    use indexmap::IndexMap;

    fn version(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|s| version(s)).collect()
    }

    fn conflicted_result(name: &str, current: &str) -> ResolutionResult {
        let mut package = ResolvedPackage::new(name, current, true);
        package.conflicts = vec!["==1.0.0".to_string(), "==2.0.0".to_string()];
        ResolutionResult {
            packages: vec![package],
            conflicts: vec![Conflict {
                package_name: name.to_string(),
                conflicting_constraints: vec!["==1.0.0".to_string(), "==2.0.0".to_string()],
                reason: format!("No published version of '{name}' satisfies ==1.0.0 and ==2.0.0"),
                affected_packages: Vec::new(),
                severity: Severity::Medium,
                resolution_suggestions: Vec::new(),
                auto_resolvable: false,
            }],
            resolutions: Vec::new(),
            dependency_tree: IndexMap::new(),
            success: false,
            warnings: Vec::new(),
        }
    }

    fn manual_resolution(name: &str, chosen: &str) -> ConflictResolution {
        ConflictResolution {
            conflict_id: Uuid::new_v4(),
            package_name: name.to_string(),
            chosen_version: chosen.to_string(),
            reason: "pinned by operator".to_string(),
            strategy_used: StrategyMode::Manual,
            alternatives_considered: vec![chosen.to_string()],
        }
    }

    #[test]
    fn test_apply_resolution_overwrites_package() {
        let mut result = conflicted_result("pkgx", "1.0.0");

        ConflictDetector::apply_resolution(&mut result, manual_resolution("pkgx", "2.0.0"));

        let package = result.package("pkgx").unwrap();
        assert_eq!(package.version, "2.0.0");
        assert!(package.conflicts.is_empty());
        assert_eq!(result.resolutions.len(), 1);
        // Every conflict now has a resolution record
        assert!(result.success);
    }

    #[test]
    fn test_apply_resolution_inserts_missing_package() {
        let mut result = conflicted_result("pkgx", "1.0.0");

        ConflictDetector::apply_resolution(&mut result, manual_resolution("extra", "0.3.0"));

        let extra = result.package("extra").unwrap();
        assert_eq!(extra.version, "0.3.0");
        assert!(!extra.direct);
        assert!(result.dependency_tree.contains_key("extra"));
        // The original conflict is still unresolved
        assert!(!result.success);
    }

    #[test]
    fn test_order_candidates_newest_first() {
        let strategy = ConflictStrategy::default();
        let ordered = order_candidates(versions(&["1.0.0", "1.5.0", "2.0.0"]), &strategy, None);
        assert_eq!(ordered, versions(&["2.0.0", "1.5.0", "1.0.0"]));
    }

    #[test]
    fn test_order_candidates_oldest_first() {
        let strategy = ConflictStrategy {
            prefer_latest: false,
            ..ConflictStrategy::default()
        };
        let ordered = order_candidates(versions(&["1.0.0", "2.0.0"]), &strategy, None);
        assert_eq!(ordered, versions(&["1.0.0", "2.0.0"]));
    }

    #[test]
    fn test_order_candidates_prefers_stable() {
        let strategy = ConflictStrategy::default();
        let ordered = order_candidates(
            versions(&["1.0.0", "2.0.0rc1"]),
            &strategy,
            None,
        );
        assert_eq!(ordered, versions(&["1.0.0"]));
    }

    #[test]
    fn test_order_candidates_prerelease_fallback() {
        let strategy = ConflictStrategy::default();
        let ordered = order_candidates(versions(&["1.0.0a1", "1.0.0b2"]), &strategy, None);
        assert_eq!(ordered, versions(&["1.0.0b2", "1.0.0a1"]));
    }

    #[test]
    fn test_order_candidates_no_downgrade() {
        let strategy = ConflictStrategy::default();
        let current = version("1.5.0");
        let ordered = order_candidates(
            versions(&["1.0.0", "1.5.0", "2.0.0"]),
            &strategy,
            Some(&current),
        );
        assert_eq!(ordered, versions(&["2.0.0", "1.5.0"]));
    }

    #[test]
    fn test_order_candidates_downgrade_allowed() {
        let strategy = ConflictStrategy {
            allow_downgrade: true,
            ..ConflictStrategy::default()
        };
        let current = version("1.5.0");
        let ordered = order_candidates(
            versions(&["1.0.0", "1.5.0", "2.0.0"]),
            &strategy,
            Some(&current),
        );
        assert_eq!(ordered, versions(&["2.0.0", "1.5.0", "1.0.0"]));
    }

    #[test]
    fn test_order_candidates_max_attempts() {
        let strategy = ConflictStrategy {
            max_attempts: 2,
            ..ConflictStrategy::default()
        };
        let ordered = order_candidates(
            versions(&["1.0.0", "1.5.0", "2.0.0"]),
            &strategy,
            None,
        );
        assert_eq!(ordered, versions(&["2.0.0", "1.5.0"]));
    }

    #[test]
    fn test_order_candidates_unbounded_when_zero() {
        let strategy = ConflictStrategy {
            max_attempts: 0,
            ..ConflictStrategy::default()
        };
        let ordered = order_candidates(versions(&["1.0.0", "1.5.0", "2.0.0"]), &strategy, None);
        assert_eq!(ordered.len(), 3);
    }
}
