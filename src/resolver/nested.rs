// src/resolver/nested.rs

//! Nested archive discovery and selection, the second pipeline stage
//!
//! Top-level archives may embed further archives, and two unrelated parents
//! can embed the same logical dependency at different versions. This stage
//! walks the embedding tree breadth-first, extracts every embedded archive
//! through the content-addressed cache, groups the observations by
//! [`ContainedArchiveId`] and picks one version per group that satisfies the
//! intersection of all requested ranges. Selected candidates that collide
//! with an explicit top-level identity are dropped with a warning; explicit
//! candidates always win.

use crate::cache::ExtractionCache;
use crate::candidate::{ArchiveCandidate, ContainedArchiveId};
use crate::error::Error;
use crate::issue::{IssueDetail, NestedRequest, ResolutionIssue};
use crate::version::VersionRange;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One discovered embedded archive, tracked back to its requesting chain
#[derive(Debug)]
struct Observation<C> {
    candidate: C,
    identifier: ContainedArchiveId,
    requested: VersionRange,
    /// Identity of the archive that declared the entry
    source: String,
    /// Identity of the top-level archive the chain descends from
    root: String,
}

/// Result of the nested-selection stage
#[derive(Debug)]
pub(crate) struct NestedOutcome<C> {
    /// Surviving nested candidates to merge into the working set, in
    /// sorted [`ContainedArchiveId`] order
    pub selected: Vec<C>,
    pub issues: Vec<ResolutionIssue>,
}

/// Discover, resolve and merge the nested archives reachable from `roots`
pub(crate) fn select<C: ArchiveCandidate>(
    roots: &[C],
    cache: &ExtractionCache,
) -> NestedOutcome<C> {
    let mut observations: Vec<Observation<C>> = Vec::new();
    let mut issues: Vec<ResolutionIssue> = Vec::new();

    for root in roots {
        let (found, problems) = scan(root, root.identity(), cache);
        observations.extend(found);
        issues.extend(problems);
    }

    // Children can embed archives of their own; the cursor walks the
    // frontier as the list grows.
    let mut cursor = 0;
    while cursor < observations.len() {
        let root = observations[cursor].root.clone();
        let (found, problems) = scan(&observations[cursor].candidate, &root, cache);
        observations.extend(found);
        issues.extend(problems);
        cursor += 1;
    }

    let mut groups: BTreeMap<ContainedArchiveId, Vec<usize>> = BTreeMap::new();
    for (position, observation) in observations.iter().enumerate() {
        groups
            .entry(observation.identifier.clone())
            .or_default()
            .push(position);
    }

    let mut winners: Vec<usize> = Vec::new();
    for (identifier, members) in &groups {
        // A lone observation has nobody to disagree with.
        if let [only] = members.as_slice() {
            winners.push(*only);
            continue;
        }

        let merged = members[1..]
            .iter()
            .try_fold(observations[members[0]].requested.clone(), |acc, &p| {
                acc.restrict(&observations[p].requested)
            });
        let Some(range) = merged else {
            debug!("Requested ranges for {} do not intersect", identifier);
            issues.push(ResolutionIssue::new(IssueDetail::VersionResolutionFailed {
                identifier: identifier.clone(),
                requests: requests_for(&observations, members),
            }));
            continue;
        };

        let winner = match range.recommended() {
            Some(recommended) => members
                .iter()
                .copied()
                .find(|&p| observations[p].candidate.version() == recommended),
            None => members
                .iter()
                .copied()
                .find(|&p| range.contains(observations[p].candidate.version())),
        };
        match winner {
            Some(position) => {
                debug!(
                    "Selected {} {} from {}",
                    identifier,
                    observations[position].candidate.version(),
                    observations[position].source
                );
                winners.push(position);
            }
            None => {
                issues.push(ResolutionIssue::new(IssueDetail::NoMatchingJar {
                    identifier: identifier.clone(),
                    requests: requests_for(&observations, members),
                }));
            }
        }
    }

    let top_level: BTreeSet<&str> = roots.iter().map(ArchiveCandidate::identity).collect();
    let mut slots: Vec<Option<Observation<C>>> = observations.into_iter().map(Some).collect();
    let mut merged_identities: BTreeSet<String> = BTreeSet::new();
    let mut selected = Vec::new();

    for position in winners {
        let Some(observation) = slots[position].take() else {
            continue;
        };
        let identity = observation.candidate.identity().to_string();
        if top_level.contains(identity.as_str()) || !merged_identities.insert(identity.clone()) {
            warn!(
                "Nested archive {} from {} shadowed by existing candidate {}",
                observation.identifier, observation.source, identity
            );
            issues.push(ResolutionIssue::new(IssueDetail::NestedArchiveShadowed {
                identifier: observation.identifier,
                archive: observation.source,
                shadowed_by: identity,
            }));
            continue;
        }
        selected.push(observation.candidate);
    }

    NestedOutcome { selected, issues }
}

/// Enumerate one archive's embedded entries and materialize each child
///
/// A not-found signal from `embedded_entries` means the archive declares
/// nothing and is skipped silently. Every other failure, including
/// per-entry read and materialization failures, becomes an
/// `embedded-archive-unreadable` issue.
fn scan<C: ArchiveCandidate>(
    archive: &C,
    root: &str,
    cache: &ExtractionCache,
) -> (Vec<Observation<C>>, Vec<ResolutionIssue>) {
    let mut observations = Vec::new();
    let mut issues = Vec::new();

    let entries = match archive.embedded_entries() {
        Ok(entries) => entries,
        Err(error) if error.is_not_found() => return (observations, issues),
        Err(error) => {
            issues.push(unreadable(archive.identity(), None, &error));
            return (observations, issues);
        }
    };

    for entry in entries {
        let content = match archive.read_resource(&entry.path) {
            Ok(content) => content,
            Err(error) => {
                issues.push(unreadable(archive.identity(), Some(&entry.path), &error));
                continue;
            }
        };
        let extracted = match cache.ensure(&content) {
            Ok(extracted) => extracted,
            Err(error) => {
                issues.push(unreadable(archive.identity(), Some(&entry.path), &error));
                continue;
            }
        };
        let child = match archive.produce_child(&entry, &extracted.path) {
            Ok(child) => child,
            Err(error) => {
                issues.push(unreadable(archive.identity(), Some(&entry.path), &error));
                continue;
            }
        };
        debug!(
            "Discovered embedded archive {} in {} at {}",
            entry.identifier,
            archive.identity(),
            entry.path
        );
        observations.push(Observation {
            candidate: child,
            identifier: entry.identifier,
            requested: entry.requested,
            source: archive.identity().to_string(),
            root: root.to_string(),
        });
    }

    (observations, issues)
}

fn unreadable(archive: &str, path: Option<&str>, error: &Error) -> ResolutionIssue {
    warn!("Could not read embedded archive in {}: {}", archive, error);
    ResolutionIssue::new(IssueDetail::EmbeddedArchiveUnreadable {
        archive: archive.to_string(),
        path: path.map(str::to_string),
        reason: error.to_string(),
    })
}

fn requests_for<C: ArchiveCandidate>(
    observations: &[Observation<C>],
    members: &[usize],
) -> Vec<NestedRequest> {
    members
        .iter()
        .map(|&position| {
            let observation = &observations[position];
            NestedRequest {
                source: observation.source.clone(),
                root: observation.root.clone(),
                requested: observation.requested.clone(),
                received: observation.candidate.version().clone(),
            }
        })
        .collect()
}
