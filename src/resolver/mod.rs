// src/resolver/mod.rs

//! Dependency resolution and load ordering
//!
//! The pipeline runs four stages in sequence: candidate deduplication,
//! nested-archive selection, constraint validation, and load ordering.
//! Each stage contributes to a shared issue list; a stage that produces a
//! fatal issue stops the pipeline, but the run still returns a degraded
//! result carrying the system components so callers can report errors
//! instead of crashing. Discouraged-dependency warnings never abort a run
//! and always land at the end of the issue list.

mod dedup;
mod nested;
mod order;
mod validate;

pub use dedup::DroppedCandidate;

use crate::cache::ExtractionCache;
use crate::candidate::{ArchiveCandidate, Component};
use crate::issue::{has_errors, ResolutionIssue};
use crate::overrides::{CompatibilityMatrix, Overrides};
use order::OrderingInput;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome of one resolution run
///
/// On success `components` holds every surviving component in load order
/// and `predecessors` maps each component id to the ids it directly waits
/// on. On failure `components` degrades to the system-critical subset in
/// discovery order and `predecessors` is empty.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    components: Vec<Component>,
    issues: Vec<ResolutionIssue>,
    predecessors: BTreeMap<String, Vec<String>>,
    dropped: Vec<DroppedCandidate>,
}

impl Resolution {
    /// Components in load order, or the degraded system subset on failure
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Every issue the run accumulated, in stage order
    pub fn issues(&self) -> &[ResolutionIssue] {
        &self.issues
    }

    /// Direct ordering predecessors per component id; empty on failure
    pub fn predecessors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.predecessors
    }

    /// Archives discarded while collapsing identity collisions
    pub fn dropped(&self) -> &[DroppedCandidate] {
        &self.dropped
    }

    /// True when no fatal issue was produced
    pub fn success(&self) -> bool {
        !has_errors(&self.issues)
    }

    /// Fatal issues only
    pub fn errors(&self) -> impl Iterator<Item = &ResolutionIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    /// Warning issues only
    pub fn warnings(&self) -> impl Iterator<Item = &ResolutionIssue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }

    /// Component ids in result order, for compact diagnostics
    pub fn ordered_ids(&self) -> Vec<&str> {
        self.components.iter().map(Component::id).collect()
    }
}

/// The resolution engine
///
/// Owns the run-independent collaborators: the extraction cache for nested
/// archives, the override map, and the compatibility matrix. One `Resolver`
/// can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Resolver {
    cache: ExtractionCache,
    overrides: Overrides,
    matrix: CompatibilityMatrix,
}

impl Resolver {
    pub fn new(cache: ExtractionCache) -> Self {
        Self {
            cache,
            overrides: Overrides::new(),
            matrix: CompatibilityMatrix::new(),
        }
    }

    /// Use the given override map for constraint removal and edge injection
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Use the given compatibility matrix as a range-check fallback
    pub fn with_matrix(mut self, matrix: CompatibilityMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// Run the full pipeline over the discovered candidates
    pub fn resolve<C: ArchiveCandidate>(&self, candidates: Vec<C>) -> Resolution {
        debug!("Resolving {} candidate archives", candidates.len());

        let deduped = dedup::deduplicate(candidates);
        let mut issues = deduped.issues;
        let dropped = deduped.dropped;
        let mut working = deduped.survivors;
        if has_errors(&issues) {
            return degraded(&working, issues, dropped);
        }

        // Stage two folds its selections into the working set, then the
        // component-id uniqueness invariant is re-checked over the merged
        // whole.
        let nested = nested::select(&working, &self.cache);
        issues.extend(nested.issues);
        working.extend(nested.selected);
        issues.extend(dedup::find_duplicate_components(&working));
        if has_errors(&issues) {
            return degraded(&working, issues, dropped);
        }

        let mut inputs: Vec<OrderingInput<'_>> = Vec::new();
        for candidate in &working {
            for component in candidate.components() {
                inputs.push(OrderingInput {
                    component,
                    archive: candidate.identity(),
                });
            }
        }
        let components: Vec<&Component> = inputs.iter().map(|input| input.component).collect();

        let validated = validate::validate(&components, &self.overrides, &self.matrix);
        let fatal = validated.is_fatal();
        issues.extend(validated.missing);
        issues.extend(validated.incompatibilities);
        if fatal {
            issues.extend(validated.discouraged);
            return degraded(&working, issues, dropped);
        }

        let ordered = order::sort(&inputs, &self.overrides);
        issues.extend(ordered.issues);
        if has_errors(&issues) {
            issues.extend(validated.discouraged);
            return degraded(&working, issues, dropped);
        }

        let by_id: BTreeMap<&str, &Component> = components
            .iter()
            .map(|component| (component.id(), *component))
            .collect();
        let mut loaded = Vec::with_capacity(ordered.order.len());
        for id in &ordered.order {
            if let Some(component) = by_id.get(id.as_str()) {
                loaded.push((*component).clone());
            }
        }

        issues.extend(validated.discouraged);
        info!(
            "Resolved {} components from {} archives ({} issues)",
            loaded.len(),
            working.len(),
            issues.len()
        );
        Resolution {
            components: loaded,
            issues,
            predecessors: ordered.predecessors,
            dropped,
        }
    }
}

/// Best-effort result for a failed run: the system-critical components in
/// discovery order, with no ordering information
fn degraded<C: ArchiveCandidate>(
    working: &[C],
    issues: Vec<ResolutionIssue>,
    dropped: Vec<DroppedCandidate>,
) -> Resolution {
    let components: Vec<Component> = working
        .iter()
        .flat_map(|candidate| candidate.components())
        .filter(|component| component.is_system())
        .cloned()
        .collect();
    debug!(
        "Pipeline stopped with {} issues, returning {} system components",
        issues.len(),
        components.len()
    );
    Resolution {
        components,
        issues,
        predecessors: BTreeMap::new(),
        dropped,
    }
}
