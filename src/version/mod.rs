// src/version/mod.rs

//! Version parsing, comparison, and Maven-style range arithmetic
//!
//! This module provides the versioning collaborator for the resolution
//! pipeline: concrete component versions with a total order, and version
//! ranges with inclusive/exclusive/unbounded endpoints that can be
//! intersected pairwise during nested-archive selection.

use crate::error::{Error, Result};
use semver::Version as SemverVersion;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed component version with numeric segments and an optional qualifier
///
/// Versions that are strict semver ("1.2.3", "1.2.3-beta.1") compare through
/// `semver` directly. Everything else falls back to zero-padded numeric
/// segment comparison, so "1.0" and "1.0.0" are equal and "1.6" sorts below
/// "1.10". A qualifier marks a pre-release: "2.0-rc1" sorts below "2.0".
#[derive(Debug, Clone)]
pub struct ComponentVersion {
    raw: String,
    segments: Vec<u64>,
    qualifier: Option<String>,
    strict: Option<SemverVersion>,
}

impl ComponentVersion {
    /// Parse a version string
    ///
    /// Format: dotted numeric segments with an optional `-qualifier` suffix.
    /// Examples:
    /// - "1.0" → segments=[1, 0], qualifier=None
    /// - "1.20.1" → segments=[1, 20, 1], qualifier=None
    /// - "2.0-rc1" → segments=[2, 0], qualifier=Some("rc1")
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidVersion {
                input: input.to_string(),
                reason: "empty version".to_string(),
            });
        }

        let (number_part, qualifier) = if let Some(dash_pos) = trimmed.find('-') {
            let (n, q) = trimmed.split_at(dash_pos);
            (n, Some(q[1..].to_string()))
        } else {
            (trimmed, None)
        };

        if number_part.is_empty() {
            return Err(Error::InvalidVersion {
                input: trimmed.to_string(),
                reason: "missing numeric part before qualifier".to_string(),
            });
        }

        let mut segments = Vec::new();
        for segment in number_part.split('.') {
            let value = segment.parse::<u64>().map_err(|_| Error::InvalidVersion {
                input: trimmed.to_string(),
                reason: format!("segment '{}' is not numeric", segment),
            })?;
            segments.push(value);
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
            qualifier,
            strict: SemverVersion::parse(trimmed).ok(),
        })
    }

    /// The version text as it was parsed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compare two versions
    ///
    /// Uses semver ordering when both sides are strict semver, otherwise
    /// compares numeric segments zero-padded to equal length, then the
    /// qualifier. An absent qualifier (a release) sorts above any present
    /// qualifier (a pre-release).
    pub fn compare(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (&self.strict, &other.strict) {
            return a.cmp(b);
        }

        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for ComponentVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// PartialEq is defined through compare() so that equality stays consistent
// with the ordering: "1.0" and "1.0.0" are the same version.
impl PartialEq for ComponentVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for ComponentVersion {}

impl Ord for ComponentVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for ComponentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ComponentVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ComponentVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ComponentVersion::parse(&text).map_err(D::Error::custom)
    }
}

/// One endpoint of a version range
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: ComponentVersion,
    inclusive: bool,
}

/// A single version interval with optional endpoints
///
/// Supports the Maven range syntax:
/// - "1.0" → soft range: any version acceptable, 1.0 recommended
/// - "[1.0]" → exactly 1.0
/// - "[1.0,2.0)" → at least 1.0, below 2.0
/// - "(,2.0]", "[1.0,)" → unbounded on the empty side
/// - "(,)" → any version
///
/// Multi-interval specs ("[1.0,2.0),[3.0,)") are not supported; every range
/// in this engine is a single interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
    recommended: Option<ComponentVersion>,
}

impl VersionRange {
    /// The range that accepts every version
    pub fn any() -> Self {
        Self {
            lower: None,
            upper: None,
            recommended: None,
        }
    }

    /// The range that accepts exactly one version
    pub fn exactly(version: ComponentVersion) -> Self {
        Self {
            lower: Some(Bound {
                version: version.clone(),
                inclusive: true,
            }),
            upper: Some(Bound {
                version,
                inclusive: true,
            }),
            recommended: None,
        }
    }

    /// Parse a Maven-style range specification
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidRange {
                input: input.to_string(),
                reason: "empty range".to_string(),
            });
        }

        let open = trimmed.chars().next();
        if !matches!(open, Some('[') | Some('(')) {
            // A bare version is a soft range: unbounded, with the stated
            // version carried as the recommendation.
            let recommended = ComponentVersion::parse(trimmed)?;
            return Ok(Self {
                lower: None,
                upper: None,
                recommended: Some(recommended),
            });
        }

        let close = trimmed.chars().last();
        if !matches!(close, Some(']') | Some(')')) {
            return Err(Error::InvalidRange {
                input: trimmed.to_string(),
                reason: "unclosed bracket".to_string(),
            });
        }

        let lower_inclusive = open == Some('[');
        let upper_inclusive = close == Some(']');
        let inner = &trimmed[1..trimmed.len() - 1];

        let (lower_text, upper_text) = match inner.find(',') {
            None => {
                // Exact range: "[1.0]" pins a single version.
                if !lower_inclusive || !upper_inclusive {
                    return Err(Error::InvalidRange {
                        input: trimmed.to_string(),
                        reason: "single-version range must use square brackets".to_string(),
                    });
                }
                (inner, inner)
            }
            Some(pos) => {
                let (l, u) = inner.split_at(pos);
                let u = &u[1..];
                if u.contains(',') {
                    return Err(Error::InvalidRange {
                        input: trimmed.to_string(),
                        reason: "multiple intervals are not supported".to_string(),
                    });
                }
                (l, u)
            }
        };

        let lower = if lower_text.trim().is_empty() {
            None
        } else {
            Some(Bound {
                version: ComponentVersion::parse(lower_text)?,
                inclusive: lower_inclusive,
            })
        };
        let upper = if upper_text.trim().is_empty() {
            None
        } else {
            Some(Bound {
                version: ComponentVersion::parse(upper_text)?,
                inclusive: upper_inclusive,
            })
        };

        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            match lo.version.compare(&hi.version) {
                Ordering::Greater => {
                    return Err(Error::InvalidRange {
                        input: trimmed.to_string(),
                        reason: "lower bound exceeds upper bound".to_string(),
                    });
                }
                Ordering::Equal if !(lo.inclusive && hi.inclusive) => {
                    return Err(Error::InvalidRange {
                        input: trimmed.to_string(),
                        reason: "identical bounds must both be inclusive".to_string(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            lower,
            upper,
            recommended: None,
        })
    }

    /// The recommended version, if this range carries one
    ///
    /// Only soft ranges ("1.0") recommend a version at parse time, but an
    /// intersection can carry a recommendation forward from either input.
    pub fn recommended(&self) -> Option<&ComponentVersion> {
        self.recommended.as_ref()
    }

    /// True when the range has no endpoints and accepts every version
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Test whether a version lies inside this range
    pub fn contains(&self, version: &ComponentVersion) -> bool {
        if let Some(bound) = &self.lower {
            match version.compare(&bound.version) {
                Ordering::Less => return false,
                Ordering::Equal if !bound.inclusive => return false,
                _ => {}
            }
        }
        if let Some(bound) = &self.upper {
            match version.compare(&bound.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !bound.inclusive => return false,
                _ => {}
            }
        }
        true
    }

    /// Intersect this range with another
    ///
    /// Returns the maximal range contained in both, or `None` when the two
    /// ranges do not overlap. The recommended version survives from `self`
    /// when the intersection still contains it, otherwise from `other`.
    pub fn restrict(&self, other: &Self) -> Option<Self> {
        let lower = tighter_bound(&self.lower, &other.lower, Ordering::Greater);
        let upper = tighter_bound(&self.upper, &other.upper, Ordering::Less);

        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            match lo.version.compare(&hi.version) {
                Ordering::Greater => return None,
                Ordering::Equal if !(lo.inclusive && hi.inclusive) => return None,
                _ => {}
            }
        }

        let mut result = Self {
            lower,
            upper,
            recommended: None,
        };
        result.recommended = [&self.recommended, &other.recommended]
            .into_iter()
            .flatten()
            .find(|v| result.contains(v))
            .cloned();
        Some(result)
    }
}

/// Pick the tighter of two optional bounds
///
/// `keep` is the ordering that makes a bound tighter: `Greater` for lower
/// bounds, `Less` for upper bounds. Equal versions keep the endpoint only if
/// both sides do.
fn tighter_bound(a: &Option<Bound>, b: &Option<Bound>, keep: Ordering) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => match x.version.compare(&y.version) {
            Ordering::Equal => Some(Bound {
                version: x.version.clone(),
                inclusive: x.inclusive && y.inclusive,
            }),
            ord if ord == keep => Some(x.clone()),
            _ => Some(y.clone()),
        },
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower.is_none() && self.upper.is_none() {
            return match &self.recommended {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "(,)"),
            };
        }

        if let (Some(lo), Some(hi)) = (&self.lower, &self.upper) {
            if lo.inclusive && hi.inclusive && lo.version == hi.version {
                return write!(f, "[{}]", lo.version);
            }
        }

        match &self.lower {
            Some(lo) => write!(f, "{}{}", if lo.inclusive { '[' } else { '(' }, lo.version)?,
            None => write!(f, "(")?,
        }
        write!(f, ",")?;
        match &self.upper {
            Some(hi) => write!(f, "{}{}", hi.version, if hi.inclusive { ']' } else { ')' }),
            None => write!(f, ")"),
        }
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        VersionRange::parse(&text).map_err(D::Error::custom)
    }
}
