// src/candidate.rs

//! Core data model for resolution runs
//!
//! An [`ArchiveCandidate`] is the caller-supplied handle to one discovered
//! content unit. The engine never opens archives or parses metadata itself;
//! identity, version, declared components, and embedded-archive entries all
//! arrive through this trait. Everything else in this module is the plain
//! data those accessors return.

use crate::error::Result;
use crate::version::{ComponentVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How a constraint participates in load ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConstraintOrdering {
    /// No ordering relationship; the constraint only checks versions
    None,
    /// The declaring component must be sequenced before the target
    Before,
    /// The declaring component must be sequenced after the target
    After,
}

/// What a constraint demands of its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConstraintKind {
    /// Target must be present with a version inside the range
    Required,
    /// Target may be absent, but if present its version must be in range
    Optional,
    /// Target must not be present with a version inside the range
    Incompatible,
    /// Like incompatible, but only worth a warning
    Discouraged,
}

/// A declared dependency of one component on another
///
/// Owned by exactly one [`Component`] and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConstraint {
    target: String,
    range: VersionRange,
    ordering: ConstraintOrdering,
    kind: ConstraintKind,
    reason: Option<String>,
}

impl DependencyConstraint {
    pub fn new(target: impl Into<String>, range: VersionRange, kind: ConstraintKind) -> Self {
        Self {
            target: target.into(),
            range,
            ordering: ConstraintOrdering::None,
            kind,
            reason: None,
        }
    }

    /// Attach an ordering mode to this constraint
    pub fn with_ordering(mut self, ordering: ConstraintOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Attach a human-readable reason for diagnostics
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The id of the component this constraint targets
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The acceptable (or, for incompatible kinds, offending) version range
    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    pub fn ordering(&self) -> ConstraintOrdering {
        self.ordering
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// A logical component declared by an archive
///
/// Component ids must be unique across the whole run once deduplication has
/// finished; the pipeline aborts if two surviving archives declare the same
/// id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    id: String,
    version: ComponentVersion,
    constraints: Vec<DependencyConstraint>,
    #[serde(default)]
    system: bool,
}

impl Component {
    pub fn new(id: impl Into<String>, version: ComponentVersion) -> Self {
        Self {
            id: id.into(),
            version,
            constraints: Vec::new(),
            system: false,
        }
    }

    /// Append a dependency constraint, preserving declaration order
    pub fn with_constraint(mut self, constraint: DependencyConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Mark this component as system-critical
    ///
    /// System-critical components (the platform itself, its loader) survive
    /// into the degraded result returned when resolution fails, so callers
    /// can still present a coherent diagnostic screen.
    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &ComponentVersion {
        &self.version
    }

    /// Constraints in declaration order
    pub fn constraints(&self) -> &[DependencyConstraint] {
        &self.constraints
    }

    pub fn is_system(&self) -> bool {
        self.system
    }
}

/// Identity of a nested archive, independent of any requested version
///
/// Two different versions of the same embedded dependency share this id;
/// it is the grouping key during nested-archive selection. Displays as
/// `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainedArchiveId {
    group: String,
    name: String,
}

impl ContainedArchiveId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ContainedArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// One embedded-archive declaration read from a candidate's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedEntry {
    /// Version-independent identity of the embedded archive
    pub identifier: ContainedArchiveId,
    /// The version range the embedding archive asks for
    pub requested: VersionRange,
    /// Relative path of the embedded archive inside its parent
    pub path: String,
}

impl EmbeddedEntry {
    pub fn new(
        identifier: ContainedArchiveId,
        requested: VersionRange,
        path: impl Into<String>,
    ) -> Self {
        Self {
            identifier,
            requested,
            path: path.into(),
        }
    }
}

/// Caller-supplied handle to one discovered content unit
///
/// The engine relies on these accessors and nothing else: it never touches
/// the filesystem for candidates directly. `read_resource` must signal a
/// missing resource with [`crate::Error::ResourceNotFound`] so the selector
/// can tell "no embedded metadata" apart from a real read failure.
pub trait ArchiveCandidate: Sized {
    /// Identity key of this archive (typically its logical file name)
    fn identity(&self) -> &str;

    /// The archive's own version
    fn version(&self) -> &ComponentVersion;

    /// Components this archive declares
    fn components(&self) -> &[Component];

    /// Read a named resource from inside the archive
    fn read_resource(&self, path: &str) -> Result<Vec<u8>>;

    /// Embedded-archive declarations carried by this archive
    ///
    /// An archive that embeds nothing returns an empty list; a
    /// [`crate::Error::ResourceNotFound`] from the metadata layer is treated
    /// the same way by the selector.
    fn embedded_entries(&self) -> Result<Vec<EmbeddedEntry>>;

    /// Materialize an embedded archive as a candidate of its own
    ///
    /// `entry` is the declaration being followed and `extracted_path` the
    /// on-disk location its bytes have been extracted to.
    fn produce_child(&self, entry: &EmbeddedEntry, extracted_path: &Path) -> Result<Self>;
}
