// src/overrides.rs

//! Externally-configured overrides for constraint checking and ordering
//!
//! Two narrow escape hatches, both supplied entirely by caller configuration
//! and consumed read-only by the pipeline:
//!
//! - [`Overrides`]: per-component rules that either remove one declared
//!   constraint or inject a synthetic "load after" edge.
//! - [`CompatibilityMatrix`]: a curated list of versions a target is known
//!   to be compatible with despite a declared range saying otherwise.

use crate::candidate::ConstraintKind;
use crate::version::{ComponentVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single override directive declared for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum OverrideRule {
    /// Treat the declaring component's constraint on `target` as absent
    ///
    /// Affects both constraint validation and the ordering edge the removed
    /// constraint would have contributed.
    RemoveConstraint { target: String },

    /// Force the declaring component to be sequenced after `target`
    RunAfter { target: String },
}

/// Override rules grouped by the declaring component id
///
/// Iteration order is the component id order, so identical configuration
/// always yields identical injected edges and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides {
    rules: BTreeMap<String, Vec<OverrideRule>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule for the given declaring component
    pub fn add(&mut self, component: impl Into<String>, rule: OverrideRule) {
        self.rules.entry(component.into()).or_default().push(rule);
    }

    /// Rules declared for one component, in registration order
    pub fn rules_for(&self, component: &str) -> &[OverrideRule] {
        self.rules.get(component).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when a removal rule hides `component`'s constraint on `target`
    pub fn removes(&self, component: &str, target: &str) -> bool {
        self.rules_for(component).iter().any(|rule| {
            matches!(rule, OverrideRule::RemoveConstraint { target: t } if t == target)
        })
    }

    /// All rules as `(declaring component, rule)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideRule)> {
        self.rules
            .iter()
            .flat_map(|(component, rules)| rules.iter().map(move |rule| (component.as_str(), rule)))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One curated compatibility exception
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Constraint kind the exception applies to
    pub kind: ConstraintKind,
    /// Target component id the exception applies to
    pub target: String,
    /// Versions the target is known to satisfy despite its declared version
    pub versions: Vec<ComponentVersion>,
}

/// Curated "known good despite the stated range" exceptions
///
/// Consulted only after a standard range check fails: if any listed version
/// for `(kind, target)` lies inside the declared range, the target is
/// treated as satisfying it. The matrix is expected to stay small; lookups
/// scan linearly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityMatrix {
    entries: Vec<MatrixEntry>,
}

impl CompatibilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `target` also effectively provides `version` for checks
    /// of the given kind
    pub fn allow(
        &mut self,
        kind: ConstraintKind,
        target: impl Into<String>,
        version: ComponentVersion,
    ) {
        let target = target.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.kind == kind && e.target == target)
        {
            entry.versions.push(version);
        } else {
            self.entries.push(MatrixEntry {
                kind,
                target,
                versions: vec![version],
            });
        }
    }

    /// Fallback containment test for a failed range check
    pub fn accepts(&self, kind: ConstraintKind, target: &str, declared: &VersionRange) -> bool {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.target == target)
            .flat_map(|e| e.versions.iter())
            .any(|version| declared.contains(version))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
