// src/issue.rs

//! Resolution issues as data
//!
//! Every expected failure mode in the pipeline becomes a [`ResolutionIssue`]
//! in the returned issue list; nothing is thrown as control flow. Each issue
//! carries a stable kebab-case message key for later localization by the
//! caller and a structured payload naming the affected components, archives,
//! and ranges. Severity is fixed by the issue kind: discouraged dependencies
//! and unknown override targets warn, everything else is an error.

use crate::candidate::ContainedArchiveId;
use crate::version::{ComponentVersion, VersionRange};
use serde::{Deserialize, Serialize};

/// How bad an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Fatal; the pipeline stops advancing and returns a degraded result
    Error,
    /// Reported but never aborts the run
    Warning,
}

/// One requesting source in a nested-resolution failure report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRequest {
    /// Identity of the archive that embeds the dependency
    pub source: String,
    /// Identity of the top-level archive this request descends from
    pub root: String,
    /// The version range the source asked for
    pub requested: VersionRange,
    /// The concrete version the source actually embeds
    pub received: ComponentVersion,
}

/// Structured payload of a resolution issue
///
/// The variant name doubles as the stable message key ("duplicate-identity",
/// "no-matching-jar", ...) through [`ResolutionIssue::message_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum_macros::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IssueDetail {
    /// Two surviving archives declare the same component id
    DuplicateIdentity {
        component: String,
        /// Every archive claiming the id, sorted by identity
        archives: Vec<String>,
    },

    /// Requested ranges for a nested archive have an empty intersection
    VersionResolutionFailed {
        identifier: ContainedArchiveId,
        requests: Vec<NestedRequest>,
    },

    /// Ranges intersect but no discovered candidate version lies inside
    NoMatchingJar {
        identifier: ContainedArchiveId,
        requests: Vec<NestedRequest>,
    },

    /// An embedded archive's bytes or metadata could not be read
    EmbeddedArchiveUnreadable {
        /// Identity of the archive the read was issued against
        archive: String,
        /// Relative path of the entry, or None when enumerating the
        /// embedded-archive metadata itself failed
        path: Option<String>,
        reason: String,
    },

    /// A selected nested archive lost to an explicit candidate with the
    /// same identity and was dropped
    NestedArchiveShadowed {
        identifier: ContainedArchiveId,
        /// Identity of the archive that embedded the dropped candidate
        archive: String,
        /// Identity of the candidate that won
        shadowed_by: String,
    },

    /// A required dependency is absent, or a required/optional target is
    /// present at a version outside the accepted range
    MissingDependency {
        component: String,
        target: String,
        accepted: VersionRange,
        /// The version actually present, or None when the target is absent
        found: Option<ComponentVersion>,
    },

    /// An incompatible target is present inside the stated range
    IncompatibleDependency {
        component: String,
        target: String,
        range: VersionRange,
        found: ComponentVersion,
        reason: Option<String>,
    },

    /// A discouraged target is present inside the stated range
    DiscouragedDependency {
        component: String,
        target: String,
        range: VersionRange,
        found: ComponentVersion,
        reason: Option<String>,
    },

    /// A strongly-connected set of components cannot be ordered
    DependencyCycle {
        /// Component ids in the cycle, sorted
        members: Vec<String>,
        /// Owning archives of the members, deduplicated and sorted
        archives: Vec<String>,
    },

    /// An override rule names a component id that does not exist
    UnknownOverrideTarget { component: String, target: String },
}

impl IssueDetail {
    fn severity(&self) -> Severity {
        match self {
            IssueDetail::DiscouragedDependency { .. }
            | IssueDetail::NestedArchiveShadowed { .. }
            | IssueDetail::UnknownOverrideTarget { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// One accumulated resolution issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionIssue {
    severity: Severity,
    #[serde(flatten)]
    detail: IssueDetail,
}

impl ResolutionIssue {
    /// Wrap a payload, deriving the severity from its kind
    pub fn new(detail: IssueDetail) -> Self {
        Self {
            severity: detail.severity(),
            detail,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Stable kebab-case message key for caller-side localization
    pub fn message_key(&self) -> &'static str {
        (&self.detail).into()
    }

    pub fn detail(&self) -> &IssueDetail {
        &self.detail
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<IssueDetail> for ResolutionIssue {
    fn from(detail: IssueDetail) -> Self {
        Self::new(detail)
    }
}

/// True when any issue in the list is an error
pub fn has_errors(issues: &[ResolutionIssue]) -> bool {
    issues.iter().any(|issue| issue.is_error())
}
