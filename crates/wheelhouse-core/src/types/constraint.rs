//! Version constraints and the package specification grammar.
//!
//! A [`VersionConstraint`] is a package name plus a set of comparison
//! clauses. Containment is the AND of all clauses; intersection is clause-set
//! union. An empty clause set means "unconstrained", which is distinct from
//! "unsatisfiable" (no version in the real release list passes containment).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::version::Version;

/// Comparison operator in a constraint clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `~=` compatible release
    Compatible,
}

impl CompareOp {
    /// Operator token as written in a spec string
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Compatible => "~=",
        }
    }
}

/// Single comparison clause (operator + version)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub op: CompareOp,
    pub version: Version,
}

impl Clause {
    /// Check whether a concrete version satisfies this clause
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            CompareOp::Eq => version.cmp(&self.version) == Ordering::Equal,
            CompareOp::Ne => version.cmp(&self.version) != Ordering::Equal,
            CompareOp::Ge => *version >= self.version,
            CompareOp::Le => *version <= self.version,
            CompareOp::Gt => *version > self.version,
            CompareOp::Lt => *version < self.version,
            CompareOp::Compatible => self.matches_compatible(version),
        }
    }

    /// `~=X.Y` means `>=X.Y` with the release prefix up to the
    /// second-to-last segment held fixed (`~=2.2` allows `2.2`..`<3`,
    /// `~=2.2.1` allows `2.2.1`..`<2.3`).
    fn matches_compatible(&self, version: &Version) -> bool {
        if *version < self.version {
            return false;
        }
        if self.version.release.len() < 2 {
            // degenerate single-segment clause behaves like >=
            return true;
        }
        let prefix_len = self.version.release.len() - 1;
        (0..prefix_len).all(|i| {
            version.release.get(i).copied().unwrap_or(0) == self.version.release[i]
        })
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// Errors from the package specification grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("Empty package specification")]
    Empty,

    #[error("Invalid version in specification '{input}': {version}")]
    BadVersion { input: String, version: String },
}

/// A package name plus a set of comparison clauses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    /// Normalized (lower-cased) package name
    pub name: String,
    /// Conjunction of clauses; empty means unconstrained
    pub clauses: Vec<Clause>,
}

/// Operator tokens, longest first so `>=` wins over `>`
const OPERATORS: [(&str, CompareOp); 7] = [
    ("==", CompareOp::Eq),
    ("!=", CompareOp::Ne),
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
    ("~=", CompareOp::Compatible),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

impl VersionConstraint {
    /// An unconstrained constraint for `name`
    pub fn unconstrained(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            clauses: Vec::new(),
        }
    }

    /// Parse a specification string such as `requests`, `requests==2.31.0`
    /// or `pandas>=1.5.0,<3`.
    ///
    /// A bare numeric token with no operator is lenient shorthand for a
    /// minimum version (`pkg 1.2` and `pkg>=...,1.2` both read as `>=1.2`).
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(SpecError::Empty);
        }

        // The name ends at the first operator character, comma or space.
        let name_end = spec
            .char_indices()
            .find(|(_, c)| matches!(c, '<' | '>' | '=' | '!' | '~' | ',') || c.is_whitespace())
            .map(|(i, _)| i)
            .unwrap_or(spec.len());
        let (name, rest) = spec.split_at(name_end);

        let name = normalize_name(name);
        if name.is_empty() {
            return Err(SpecError::Empty);
        }

        let mut clauses = Vec::new();
        for token in rest.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            clauses.push(parse_clause(spec, token)?);
        }

        Ok(Self { name, clauses })
    }

    /// Check whether a concrete version satisfies every clause
    pub fn contains(&self, version: &Version) -> bool {
        self.clauses.iter().all(|clause| clause.matches(version))
    }

    /// True when no clauses constrain this package
    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    /// AND of two constraints: the union of their clause sets.
    ///
    /// Intersecting with an unconstrained constraint is a no-op; the result
    /// keeps `self`'s name.
    pub fn intersect(&self, other: &VersionConstraint) -> VersionConstraint {
        let mut clauses = self.clauses.clone();
        clauses.extend(other.clauses.iter().cloned());
        VersionConstraint {
            name: self.name.clone(),
            clauses,
        }
    }

    /// Whether any version in the real release list passes containment.
    ///
    /// Satisfiability is approximated against the actual fetched versions
    /// rather than by symbolic range arithmetic, which is ambiguous over
    /// pre-release suffixes.
    pub fn is_satisfiable_against(&self, versions: &[Version]) -> bool {
        versions.iter().any(|v| self.contains(v))
    }

    /// Clause set rendered without the package name (`>=1.0,<2.0`),
    /// or `*` when unconstrained
    pub fn clauses_display(&self) -> String {
        if self.clauses.is_empty() {
            return "*".to_string();
        }
        let parts: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        parts.join(",")
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}", self.name, self.clauses_display())
        }
    }
}

fn parse_clause(spec: &str, token: &str) -> Result<Clause, SpecError> {
    for (symbol, op) in OPERATORS {
        if let Some(version_str) = token.strip_prefix(symbol) {
            let version =
                Version::from_str(version_str.trim()).map_err(|_| SpecError::BadVersion {
                    input: spec.to_string(),
                    version: version_str.trim().to_string(),
                })?;
            return Ok(Clause { op, version });
        }
    }

    // No operator: bare numeric token is minimum-version shorthand.
    let version = Version::from_str(token).map_err(|_| SpecError::BadVersion {
        input: spec.to_string(),
        version: token.to_string(),
    })?;
    Ok(Clause {
        op: CompareOp::Ge,
        version,
    })
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Parse a raw dependency string from registry metadata.
///
/// Strips extras-in-brackets, parenthesized environment markers and any
/// `;`-suffixed marker before applying the spec grammar. Returns `None` for
/// empty residue or a residue that fails to parse (fail closed).
pub fn parse_dependency(dep: &str) -> Option<VersionConstraint> {
    let cleaned = strip_spans(dep, '[', ']');
    let cleaned = strip_spans(&cleaned, '(', ')');
    let cleaned = cleaned.split(';').next().unwrap_or("").trim().to_string();

    if cleaned.is_empty() {
        return None;
    }
    VersionConstraint::parse(&cleaned).ok()
}

/// Remove every `open`..`close` span (content included)
fn strip_spans(input: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut depth = 0usize;
    for c in input.chars() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            out.push(c);
        }
    }
    out
}
