// src/resolver/validate.rs

//! Constraint validation, the third pipeline stage
//!
//! Every surviving component's declared constraints are checked against the
//! final discovered set. Required targets must be present and in range;
//! optional targets may be absent but must be in range when present;
//! incompatible and discouraged targets must not be present inside their
//! stated range. A failed range check gets one last chance through the
//! curated [`CompatibilityMatrix`] before becoming an issue.

use crate::candidate::{Component, ConstraintKind, DependencyConstraint};
use crate::issue::{IssueDetail, ResolutionIssue};
use crate::overrides::{CompatibilityMatrix, Overrides};
use crate::version::ComponentVersion;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of the validation stage, categorized the way callers report it
#[derive(Debug)]
pub(crate) struct ValidationOutcome {
    /// Required targets absent or out of range, and optional targets
    /// present out of range; any entry aborts the pipeline
    pub missing: Vec<ResolutionIssue>,
    /// Incompatible targets present in range; any entry aborts the pipeline
    pub incompatibilities: Vec<ResolutionIssue>,
    /// Discouraged targets present in range; warnings only, appended after
    /// whatever the final result is
    pub discouraged: Vec<ResolutionIssue>,
    /// Version of every surviving component, for payload formatting
    pub versions: BTreeMap<String, ComponentVersion>,
}

impl ValidationOutcome {
    /// True when the pipeline must stop before ordering
    pub fn is_fatal(&self) -> bool {
        !self.missing.is_empty() || !self.incompatibilities.is_empty()
    }
}

/// Check every component's constraints against the surviving set
pub(crate) fn validate(
    components: &[&Component],
    overrides: &Overrides,
    matrix: &CompatibilityMatrix,
) -> ValidationOutcome {
    let versions: BTreeMap<String, ComponentVersion> = components
        .iter()
        .map(|component| (component.id().to_string(), component.version().clone()))
        .collect();

    let mut missing = Vec::new();
    let mut incompatibilities = Vec::new();
    let mut discouraged = Vec::new();

    for component in components {
        for constraint in component.constraints() {
            if overrides.removes(component.id(), constraint.target()) {
                debug!(
                    "Override removed constraint {} -> {}",
                    component.id(),
                    constraint.target()
                );
                continue;
            }

            let present = versions.get(constraint.target());
            match constraint.kind() {
                ConstraintKind::Required => match present {
                    None => {
                        missing.push(missing_issue(component, constraint, None));
                    }
                    Some(found) if !satisfied(found, constraint, matrix) => {
                        missing.push(missing_issue(component, constraint, Some(found.clone())));
                    }
                    Some(_) => {}
                },
                ConstraintKind::Optional => {
                    // Absent optional targets are fine; present ones must
                    // still be in range.
                    if let Some(found) = present {
                        if !satisfied(found, constraint, matrix) {
                            missing.push(missing_issue(component, constraint, Some(found.clone())));
                        }
                    }
                }
                ConstraintKind::Incompatible => {
                    if let Some(found) = present {
                        if constraint.range().contains(found) {
                            incompatibilities.push(ResolutionIssue::new(
                                IssueDetail::IncompatibleDependency {
                                    component: component.id().to_string(),
                                    target: constraint.target().to_string(),
                                    range: constraint.range().clone(),
                                    found: found.clone(),
                                    reason: constraint.reason().map(str::to_string),
                                },
                            ));
                        }
                    }
                }
                ConstraintKind::Discouraged => {
                    if let Some(found) = present {
                        if constraint.range().contains(found) {
                            warn!(
                                "Component {} discourages {} {}",
                                component.id(),
                                constraint.target(),
                                found
                            );
                            discouraged.push(ResolutionIssue::new(
                                IssueDetail::DiscouragedDependency {
                                    component: component.id().to_string(),
                                    target: constraint.target().to_string(),
                                    range: constraint.range().clone(),
                                    found: found.clone(),
                                    reason: constraint.reason().map(str::to_string),
                                },
                            ));
                        }
                    }
                }
            }
        }
    }

    ValidationOutcome {
        missing,
        incompatibilities,
        discouraged,
        versions,
    }
}

/// Standard range check with the compatibility-matrix fallback
fn satisfied(
    found: &ComponentVersion,
    constraint: &DependencyConstraint,
    matrix: &CompatibilityMatrix,
) -> bool {
    constraint.range().contains(found)
        || matrix.accepts(constraint.kind(), constraint.target(), constraint.range())
}

fn missing_issue(
    component: &Component,
    constraint: &DependencyConstraint,
    found: Option<ComponentVersion>,
) -> ResolutionIssue {
    ResolutionIssue::new(IssueDetail::MissingDependency {
        component: component.id().to_string(),
        target: constraint.target().to_string(),
        accepted: constraint.range().clone(),
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionRange;

    fn ver(s: &str) -> ComponentVersion {
        ComponentVersion::parse(s).unwrap()
    }

    fn range(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    fn check(components: &[Component]) -> ValidationOutcome {
        let refs: Vec<&Component> = components.iter().collect();
        validate(&refs, &Overrides::new(), &CompatibilityMatrix::new())
    }

    #[test]
    fn test_required_present_in_range_passes() {
        let components = vec![
            Component::new("minecraft", ver("1.20")),
            Component::new("neoforge", ver("20.4")).with_constraint(DependencyConstraint::new(
                "minecraft",
                range("[1.20,1.21)"),
                ConstraintKind::Required,
            )),
        ];
        let outcome = check(&components);

        assert!(!outcome.is_fatal());
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn test_required_absent_is_fatal() {
        let components = vec![Component::new("mod", ver("1.0")).with_constraint(
            DependencyConstraint::new("ghost", range("[1.0,)"), ConstraintKind::Required),
        )];
        let outcome = check(&components);

        assert!(outcome.is_fatal());
        assert_eq!(outcome.missing.len(), 1);
        assert_eq!(outcome.missing[0].message_key(), "missing-dependency");
        match outcome.missing[0].detail() {
            IssueDetail::MissingDependency { found, .. } => assert!(found.is_none()),
            other => panic!("unexpected issue detail: {:?}", other),
        }
    }

    #[test]
    fn test_required_out_of_range_is_fatal() {
        let components = vec![
            Component::new("minecraft", ver("1.19")),
            Component::new("neoforge", ver("20.4")).with_constraint(DependencyConstraint::new(
                "minecraft",
                range("[1.20,1.21)"),
                ConstraintKind::Required,
            )),
        ];
        let outcome = check(&components);

        assert!(outcome.is_fatal());
        match outcome.missing[0].detail() {
            IssueDetail::MissingDependency { found, .. } => {
                assert_eq!(found.as_ref(), Some(&ver("1.19")));
            }
            other => panic!("unexpected issue detail: {:?}", other),
        }
    }

    #[test]
    fn test_optional_absent_is_fine() {
        let components = vec![Component::new("mod", ver("1.0")).with_constraint(
            DependencyConstraint::new("extra", range("[1.0,)"), ConstraintKind::Optional),
        )];
        let outcome = check(&components);

        assert!(!outcome.is_fatal());
    }

    #[test]
    fn test_optional_present_out_of_range_is_fatal() {
        let components = vec![
            Component::new("extra", ver("0.9")),
            Component::new("mod", ver("1.0")).with_constraint(DependencyConstraint::new(
                "extra",
                range("[1.0,)"),
                ConstraintKind::Optional,
            )),
        ];
        let outcome = check(&components);

        assert!(outcome.is_fatal());
        assert_eq!(outcome.missing.len(), 1);
    }

    #[test]
    fn test_incompatible_present_in_range_is_fatal() {
        let components = vec![
            Component::new("badlib", ver("1.5")),
            Component::new("mod", ver("1.0")).with_constraint(
                DependencyConstraint::new("badlib", range("[1.0,2.0)"), ConstraintKind::Incompatible)
                    .with_reason("breaks world saves"),
            ),
        ];
        let outcome = check(&components);

        assert!(outcome.is_fatal());
        assert_eq!(outcome.incompatibilities.len(), 1);
        assert_eq!(
            outcome.incompatibilities[0].message_key(),
            "incompatible-dependency"
        );
        match outcome.incompatibilities[0].detail() {
            IssueDetail::IncompatibleDependency { reason, .. } => {
                assert_eq!(reason.as_deref(), Some("breaks world saves"));
            }
            other => panic!("unexpected issue detail: {:?}", other),
        }
    }

    #[test]
    fn test_incompatible_out_of_range_passes() {
        let components = vec![
            Component::new("badlib", ver("2.5")),
            Component::new("mod", ver("1.0")).with_constraint(DependencyConstraint::new(
                "badlib",
                range("[1.0,2.0)"),
                ConstraintKind::Incompatible,
            )),
        ];
        let outcome = check(&components);

        assert!(!outcome.is_fatal());
    }

    #[test]
    fn test_discouraged_warns_without_aborting() {
        let components = vec![
            Component::new("oldlib", ver("1.5")),
            Component::new("mod", ver("1.0")).with_constraint(DependencyConstraint::new(
                "oldlib",
                range("[1.0,2.0)"),
                ConstraintKind::Discouraged,
            )),
        ];
        let outcome = check(&components);

        assert!(!outcome.is_fatal());
        assert_eq!(outcome.discouraged.len(), 1);
        assert!(!outcome.discouraged[0].is_error());
    }

    #[test]
    fn test_matrix_rescues_failed_range_check() {
        let components = vec![
            Component::new("minecraft", ver("1.19.3")),
            Component::new("mod", ver("1.0")).with_constraint(DependencyConstraint::new(
                "minecraft",
                range("[1.19.2]"),
                ConstraintKind::Required,
            )),
        ];

        let refs: Vec<&Component> = components.iter().collect();
        let mut matrix = CompatibilityMatrix::new();
        matrix.allow(ConstraintKind::Required, "minecraft", ver("1.19.2"));

        let outcome = validate(&refs, &Overrides::new(), &matrix);
        assert!(!outcome.is_fatal());
    }

    #[test]
    fn test_override_removal_skips_constraint() {
        let components = vec![Component::new("mod", ver("1.0")).with_constraint(
            DependencyConstraint::new("ghost", range("[1.0,)"), ConstraintKind::Required),
        )];
        let refs: Vec<&Component> = components.iter().collect();

        let mut overrides = Overrides::new();
        overrides.add(
            "mod",
            crate::overrides::OverrideRule::RemoveConstraint {
                target: "ghost".to_string(),
            },
        );

        let outcome = validate(&refs, &overrides, &CompatibilityMatrix::new());
        assert!(!outcome.is_fatal());
    }

    #[test]
    fn test_versions_map_covers_all_components() {
        let components = vec![
            Component::new("a", ver("1.0")),
            Component::new("b", ver("2.0")),
        ];
        let outcome = check(&components);

        assert_eq!(outcome.versions.len(), 2);
        assert_eq!(outcome.versions["b"], ver("2.0"));
    }
}
