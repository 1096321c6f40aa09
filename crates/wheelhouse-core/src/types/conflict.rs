//! Conflict reporting and resolution-strategy configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How severe a conflict is, derived from how many dependents it affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity rule: more than two affected dependents is `High`,
    /// otherwise `Medium`
    pub fn from_dependents(affected: usize) -> Self {
        if affected > 2 {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// An unsatisfiable constraint intersection for one package name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Package whose collected constraints disagree
    pub package_name: String,
    /// The conflicting constraints, stringified for reporting
    pub conflicting_constraints: Vec<String>,
    /// Human-readable reason
    pub reason: String,
    /// Resolved packages that depend on this package
    pub affected_packages: Vec<String>,
    pub severity: Severity,
    /// Suggested replacement versions / constraint options
    pub resolution_suggestions: Vec<String>,
    /// Whether the auto strategy may attempt a repair
    pub auto_resolvable: bool,
}

/// Conflict-handling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    /// Attempt automatic repair, best effort
    Auto,
    /// Report conflicts and suggestions, mutate nothing
    Manual,
    /// Report conflicts, attempt nothing
    Ignore,
    /// Abort the run on any conflict
    Fail,
}

impl FromStr for StrategyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StrategyMode::Auto),
            "manual" => Ok(StrategyMode::Manual),
            "ignore" => Ok(StrategyMode::Ignore),
            "fail" => Ok(StrategyMode::Fail),
            other => Err(format!(
                "unknown strategy '{other}' (expected auto, manual, ignore or fail)"
            )),
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyMode::Auto => "auto",
            StrategyMode::Manual => "manual",
            StrategyMode::Ignore => "ignore",
            StrategyMode::Fail => "fail",
        };
        write!(f, "{s}")
    }
}

/// Conflict-resolution configuration. Configuration, not mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictStrategy {
    pub mode: StrategyMode,
    /// Walk candidate versions newest-first when repairing
    pub prefer_latest: bool,
    /// Skip pre-release candidates unless nothing stable exists
    pub prefer_stable: bool,
    /// Allow repairs that pick a version below the currently resolved one
    pub allow_downgrade: bool,
    /// Cap on candidate versions the auto repair walks; 0 means unbounded
    pub max_attempts: usize,
}

impl Default for ConflictStrategy {
    fn default() -> Self {
        Self {
            mode: StrategyMode::Auto,
            prefer_latest: true,
            prefer_stable: true,
            allow_downgrade: false,
            max_attempts: 3,
        }
    }
}

/// Audit record of one applied (or attempted) conflict resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub conflict_id: Uuid,
    pub package_name: String,
    pub chosen_version: String,
    pub reason: String,
    pub strategy_used: StrategyMode,
    /// Versions considered before (and including) the chosen one
    pub alternatives_considered: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rule() {
        assert_eq!(Severity::from_dependents(0), Severity::Medium);
        assert_eq!(Severity::from_dependents(2), Severity::Medium);
        assert_eq!(Severity::from_dependents(3), Severity::High);
        assert_eq!(Severity::from_dependents(10), Severity::High);
    }

    #[test]
    fn test_strategy_mode_parsing() {
        assert_eq!(StrategyMode::from_str("auto").unwrap(), StrategyMode::Auto);
        assert_eq!(StrategyMode::from_str("FAIL").unwrap(), StrategyMode::Fail);
        assert!(StrategyMode::from_str("bogus").is_err());
    }

    #[test]
    fn test_default_strategy() {
        let strategy = ConflictStrategy::default();
        assert_eq!(strategy.mode, StrategyMode::Auto);
        assert!(strategy.prefer_latest);
        assert!(strategy.prefer_stable);
        assert!(!strategy.allow_downgrade);
        assert_eq!(strategy.max_attempts, 3);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::High.to_string(), "high");
        assert_eq!(Severity::Medium.to_string(), "medium");
    }
}
