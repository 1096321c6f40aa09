//! PyPI-style version type.
//!
//! Models the subset of PEP 440 version precedence the resolver needs:
//! dotted numeric release segments compared by numeric value, plus an
//! optional pre-release/dev tag that sorts before its final release.
//! Unknown suffix words attached to the release are treated as
//! equal-weight alphabetic tokens; a suffix separated by `.`, `-` or `_`
//! must carry a known tag word (`1.0.dev3` parses, `1.2.x` does not).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A concrete package version (e.g. `2.31.0`, `1.0.0rc1`, `4.0.dev2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Dotted numeric release segments, compared numerically left-to-right.
    /// Missing trailing segments compare as zero (`1.0` == `1.0.0`).
    pub release: Vec<u64>,
    /// Pre-release tag, if any. `None` sorts after any tag.
    pub pre: Option<PreRelease>,
}

/// Pre-release/dev suffix: a tag word plus a numeric counter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreRelease {
    /// Canonical tag word (`alpha`, `beta`, `rc`, `dev`, `pre`, or any
    /// unknown word kept verbatim)
    pub tag: String,
    /// Counter after the tag (`rc1` -> 1, bare `rc` -> 0)
    pub number: u64,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },
}

impl Version {
    /// Create a plain three-segment release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            release: vec![major, minor, patch],
            pre: None,
        }
    }

    /// Check if this version carries a pre-release/dev tag
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Release segment at `index`, zero when absent
    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    /// Compare release segments only, zero-padding the shorter version
    pub fn release_cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.release_cmp(other) {
            Ordering::Equal => match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // pre-release sorts before its final release
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.tag.cmp(&b.tag).then(a.number.cmp(&b.number)),
            },
            other => other,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tag words accepted when the suffix is separated from the release part
fn is_known_tag(tag: &str) -> bool {
    matches!(tag, "alpha" | "beta" | "rc" | "dev" | "pre" | "post")
}

/// Canonicalize a pre-release tag word (`a` -> `alpha`, `c` -> `rc`, ...)
fn canonical_tag(word: &str) -> String {
    match word {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "c" => "rc".to_string(),
        "preview" => "pre".to_string(),
        other => other.to_string(),
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let input = input.strip_prefix('v').unwrap_or(&input);

        if input.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        // Split into the numeric release part and the suffix at the first
        // character that is neither a digit nor a dot.
        let split = input
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
            .map(|(i, _)| i)
            .unwrap_or(input.len());
        let (release_part, suffix) = input.split_at(split);

        let trimmed = release_part.trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }
        // A dot separating the release from the suffix, or a suffix opening
        // with a separator, signals a dotted suffix segment rather than an
        // attached tag.
        let separated = trimmed.len() != release_part.len() || suffix.starts_with(['.', '-', '_']);

        let mut release = Vec::new();
        for component in trimmed.split('.') {
            let value = component.parse().map_err(|_| VersionError::InvalidNumber {
                component: component.to_string(),
            })?;
            release.push(value);
        }

        let pre = if suffix.is_empty() {
            None
        } else {
            let parsed = parse_suffix(suffix).ok_or_else(|| VersionError::InvalidFormat {
                input: s.to_string(),
            })?;
            if separated && !is_known_tag(&parsed.tag) {
                return Err(VersionError::InvalidFormat {
                    input: s.to_string(),
                });
            }
            Some(parsed)
        };

        Ok(Version { release, pre })
    }
}

/// Parse a pre-release suffix like `rc1`, `-alpha.2`, `.dev0`
fn parse_suffix(suffix: &str) -> Option<PreRelease> {
    let body = suffix.trim_start_matches(['.', '-', '_']);
    if body.is_empty() {
        return None;
    }

    let tag_end = body
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    let (word, rest) = body.split_at(tag_end);
    if word.is_empty() {
        return None;
    }

    let rest = rest.trim_start_matches(['.', '-', '_']);
    let number = if rest.is_empty() {
        0
    } else {
        rest.parse().ok()?
    };

    Some(PreRelease {
        tag: canonical_tag(word),
        number,
    })
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some(ref pre) = self.pre {
            write!(f, "{}{}", pre.tag, pre.number)?;
        }
        Ok(())
    }
}
