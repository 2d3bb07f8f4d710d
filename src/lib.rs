// src/lib.rs

//! Muster - mod dependency resolution and load ordering
//!
//! Given a set of discovered archive candidates, the engine deduplicates
//! archives claiming the same identity, resolves version conflicts among
//! nested archives embedded by several parents, validates every declared
//! dependency constraint against what was actually discovered, and computes
//! a deterministic load order from the surviving BEFORE/AFTER constraints.
//!
//! # Architecture
//!
//! - Trait boundary: candidates arrive through [`ArchiveCandidate`]; the
//!   engine never scans directories or parses archive bytes itself
//! - Pipeline: four stages behind one [`Resolver`], each able to stop the
//!   run with fatal issues while preserving a degraded result
//! - Issues as data: every failure is a [`ResolutionIssue`] with a stable
//!   kebab-case key and structured payload, never a pre-rendered string
//! - Content-addressed extraction: embedded archives land in an
//!   [`ExtractionCache`] keyed by SHA-256, extracted once per distinct bytes

pub mod cache;
pub mod candidate;
mod error;
pub mod issue;
pub mod overrides;
pub mod resolver;
pub mod version;

pub use cache::{Extracted, ExtractionCache};
pub use candidate::{
    ArchiveCandidate, Component, ConstraintKind, ConstraintOrdering, ContainedArchiveId,
    DependencyConstraint, EmbeddedEntry,
};
pub use error::{Error, Result};
pub use issue::{has_errors, IssueDetail, NestedRequest, ResolutionIssue, Severity};
pub use overrides::{CompatibilityMatrix, MatrixEntry, OverrideRule, Overrides};
pub use resolver::{DroppedCandidate, Resolution, Resolver};
pub use version::{ComponentVersion, VersionRange};
