// src/resolver/dedup.rs

//! Candidate deduplication, the first pipeline stage
//!
//! Collapses archives claiming the same identity down to the highest
//! version, then verifies that no component id is provided by more than one
//! surviving archive. Archive-identity collisions are routine (the same
//! dependency shipped at several versions) and only logged; component-id
//! collisions are fatal because every later stage assumes ids are unique.

use crate::candidate::ArchiveCandidate;
use crate::issue::{IssueDetail, ResolutionIssue};
use crate::version::ComponentVersion;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Record of one archive discarded in favor of a higher version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedCandidate {
    /// Shared identity of the colliding archives
    pub identity: String,
    /// Version of the discarded archive
    pub dropped: ComponentVersion,
    /// Version of the archive that survived
    pub kept: ComponentVersion,
}

/// Result of the deduplication stage
#[derive(Debug)]
pub(crate) struct DedupOutcome<C> {
    /// Candidates that survived, in discovery order
    pub survivors: Vec<C>,
    /// Archives discarded during identity collapsing
    pub dropped: Vec<DroppedCandidate>,
    /// Fatal duplicate-identity issues; non-empty aborts the pipeline
    pub issues: Vec<ResolutionIssue>,
}

/// Collapse identity collisions and check component-id uniqueness
pub(crate) fn deduplicate<C: ArchiveCandidate>(candidates: Vec<C>) -> DedupOutcome<C> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, candidate) in candidates.iter().enumerate() {
        groups
            .entry(candidate.identity().to_string())
            .or_default()
            .push(index);
    }

    let mut keep = vec![true; candidates.len()];
    let mut dropped = Vec::new();
    for (identity, indices) in &groups {
        if indices.len() < 2 {
            continue;
        }

        // Strictly-greater comparison keeps the earliest-discovered archive
        // when versions tie.
        let mut best = indices[0];
        for &index in &indices[1..] {
            if candidates[index].version() > candidates[best].version() {
                best = index;
            }
        }

        for &index in indices {
            if index == best {
                continue;
            }
            keep[index] = false;
            debug!(
                "Dropping duplicate archive '{}' at {} in favor of {}",
                identity,
                candidates[index].version(),
                candidates[best].version()
            );
            dropped.push(DroppedCandidate {
                identity: identity.clone(),
                dropped: candidates[index].version().clone(),
                kept: candidates[best].version().clone(),
            });
        }
    }

    let survivors: Vec<C> = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, kept)| kept.then_some(candidate))
        .collect();

    let issues = find_duplicate_components(&survivors);

    DedupOutcome {
        survivors,
        dropped,
        issues,
    }
}

/// One `duplicate-identity` error per component id declared by more than
/// one distinct archive
///
/// Also run by the driver after nested candidates are merged in, so the
/// uniqueness invariant holds over the final working set too.
pub(crate) fn find_duplicate_components<C: ArchiveCandidate>(
    candidates: &[C],
) -> Vec<ResolutionIssue> {
    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for candidate in candidates {
        for component in candidate.components() {
            owners
                .entry(component.id())
                .or_default()
                .push(candidate.identity());
        }
    }

    let mut issues = Vec::new();
    for (component, archives) in owners {
        let mut archives: Vec<String> = archives.into_iter().map(str::to_string).collect();
        archives.sort();
        archives.dedup();
        if archives.len() > 1 {
            issues.push(ResolutionIssue::new(IssueDetail::DuplicateIdentity {
                component: component.to_string(),
                archives,
            }));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Component;
    use crate::error::{Error, Result};
    use crate::version::ComponentVersion;

    struct FakeArchive {
        identity: String,
        version: ComponentVersion,
        components: Vec<Component>,
    }

    impl FakeArchive {
        fn new(identity: &str, version: &str) -> Self {
            Self {
                identity: identity.to_string(),
                version: ComponentVersion::parse(version).unwrap(),
                components: Vec::new(),
            }
        }

        fn with_component(mut self, id: &str, version: &str) -> Self {
            self.components
                .push(Component::new(id, ComponentVersion::parse(version).unwrap()));
            self
        }
    }

    impl ArchiveCandidate for FakeArchive {
        fn identity(&self) -> &str {
            &self.identity
        }

        fn version(&self) -> &ComponentVersion {
            &self.version
        }

        fn components(&self) -> &[Component] {
            &self.components
        }

        fn read_resource(&self, path: &str) -> Result<Vec<u8>> {
            Err(Error::ResourceNotFound {
                archive: self.identity.clone(),
                path: path.to_string(),
            })
        }

        fn embedded_entries(&self) -> Result<Vec<crate::candidate::EmbeddedEntry>> {
            Ok(Vec::new())
        }

        fn produce_child(
            &self,
            entry: &crate::candidate::EmbeddedEntry,
            _extracted_path: &std::path::Path,
        ) -> Result<Self> {
            Err(Error::ResourceNotFound {
                archive: self.identity.clone(),
                path: entry.path.clone(),
            })
        }
    }

    #[test]
    fn test_unique_identities_pass_through() {
        let outcome = deduplicate(vec![
            FakeArchive::new("a.jar", "1.0"),
            FakeArchive::new("b.jar", "2.0"),
        ]);

        assert_eq!(outcome.survivors.len(), 2);
        assert!(outcome.dropped.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_highest_version_survives() {
        let outcome = deduplicate(vec![
            FakeArchive::new("lib.jar", "1.0"),
            FakeArchive::new("other.jar", "1.0"),
            FakeArchive::new("lib.jar", "2.5"),
            FakeArchive::new("lib.jar", "1.6"),
        ]);

        assert_eq!(outcome.survivors.len(), 2);
        assert_eq!(outcome.survivors[0].identity(), "other.jar");
        assert_eq!(outcome.survivors[1].identity(), "lib.jar");
        assert_eq!(
            outcome.survivors[1].version(),
            &ComponentVersion::parse("2.5").unwrap()
        );
        assert_eq!(outcome.dropped.len(), 2);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_equal_versions_keep_earliest() {
        let mut first = FakeArchive::new("lib.jar", "1.0");
        first.components.push(Component::new(
            "marker",
            ComponentVersion::parse("1.0").unwrap(),
        ));
        let second = FakeArchive::new("lib.jar", "1.0");

        let outcome = deduplicate(vec![first, second]);
        assert_eq!(outcome.survivors.len(), 1);
        // The earliest-discovered archive is the one carrying the marker.
        assert_eq!(outcome.survivors[0].components().len(), 1);
    }

    #[test]
    fn test_duplicate_component_id_is_fatal() {
        let outcome = deduplicate(vec![
            FakeArchive::new("a.jar", "1.0").with_component("core", "1.0"),
            FakeArchive::new("b.jar", "1.0").with_component("core", "2.0"),
        ]);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].message_key(), "duplicate-identity");
        match outcome.issues[0].detail() {
            IssueDetail::DuplicateIdentity {
                component,
                archives,
            } => {
                assert_eq!(component, "core");
                assert_eq!(archives, &["a.jar".to_string(), "b.jar".to_string()]);
            }
            other => panic!("unexpected issue detail: {:?}", other),
        }
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let first = deduplicate(vec![
            FakeArchive::new("lib.jar", "1.0"),
            FakeArchive::new("lib.jar", "2.0"),
            FakeArchive::new("app.jar", "1.0").with_component("app", "1.0"),
        ]);
        assert_eq!(first.dropped.len(), 1);

        let second = deduplicate(first.survivors);
        assert!(second.dropped.is_empty());
        assert!(second.issues.is_empty());
        assert_eq!(second.survivors.len(), 2);
    }

    #[test]
    fn test_same_archive_collapses_before_component_check() {
        // Two copies of the same archive both declare "core"; after identity
        // collapsing only one remains, so no duplicate-identity error.
        let outcome = deduplicate(vec![
            FakeArchive::new("lib.jar", "1.0").with_component("core", "1.0"),
            FakeArchive::new("lib.jar", "2.0").with_component("core", "2.0"),
        ]);

        assert_eq!(outcome.survivors.len(), 1);
        assert!(outcome.issues.is_empty());
    }
}
