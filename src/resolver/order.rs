// src/resolver/order.rs

//! Load-order computation, the final pipeline stage
//!
//! Components are assigned insertion-order integers in a single pass and the
//! ordering graph is plain adjacency lists over those indices; no node
//! identity, no map iteration order anywhere near the result. Kahn's
//! algorithm with a min-heap on the insertion index gives a deterministic
//! total order; when it stalls, Tarjan's strongly-connected components turn
//! the leftover graph into one cycle report per offending group.

use crate::candidate::{Component, ConstraintOrdering};
use crate::issue::{IssueDetail, ResolutionIssue};
use crate::overrides::{OverrideRule, Overrides};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use tracing::{debug, warn};

/// One component entering the ordering stage, with its owning archive
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderingInput<'a> {
    pub component: &'a Component,
    pub archive: &'a str,
}

/// Result of the ordering stage
#[derive(Debug)]
pub(crate) struct OrderOutcome {
    /// Component ids in load order; empty when cycles were reported
    pub order: Vec<String>,
    /// Direct ordering predecessors per component id, every id present
    pub predecessors: BTreeMap<String, Vec<String>>,
    /// Cycle errors and unknown-override warnings
    pub issues: Vec<ResolutionIssue>,
}

/// Build the ordering graph and compute a deterministic total order
///
/// An edge `from -> to` means `from` must be sequenced before `to`. BEFORE
/// constraints contribute `self -> target`, AFTER constraints contribute
/// `target -> self`, and `RunAfter` overrides contribute
/// `target -> declaring`. Constraints hidden by a removal override
/// contribute nothing.
pub(crate) fn sort(inputs: &[OrderingInput<'_>], overrides: &Overrides) -> OrderOutcome {
    let count = inputs.len();
    let mut issues = Vec::new();

    let mut index_by_id: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, input) in inputs.iter().enumerate() {
        index_by_id.insert(input.component.id(), index);
    }

    let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
    for (index, input) in inputs.iter().enumerate() {
        for constraint in input.component.constraints() {
            if constraint.ordering() == ConstraintOrdering::None {
                continue;
            }
            if overrides.removes(input.component.id(), constraint.target()) {
                debug!(
                    "Override removed ordering constraint {} -> {}",
                    input.component.id(),
                    constraint.target()
                );
                continue;
            }
            // Targets absent from the surviving set order nothing.
            let Some(&target) = index_by_id.get(constraint.target()) else {
                continue;
            };
            let (from, to) = if constraint.ordering() == ConstraintOrdering::Before {
                (index, target)
            } else {
                (target, index)
            };
            edges[from].insert(to);
        }
    }

    for (declaring, rule) in overrides.iter() {
        let OverrideRule::RunAfter { target } = rule else {
            continue;
        };
        match (index_by_id.get(declaring), index_by_id.get(target.as_str())) {
            (Some(&declaring_index), Some(&target_index)) => {
                debug!("Override sequences {} after {}", declaring, target);
                edges[target_index].insert(declaring_index);
            }
            _ => {
                warn!(
                    "Override sequencing '{}' after '{}' names an unknown component",
                    declaring, target
                );
                issues.push(ResolutionIssue::new(IssueDetail::UnknownOverrideTarget {
                    component: declaring.to_string(),
                    target: target.clone(),
                }));
            }
        }
    }

    let mut in_degree = vec![0usize; count];
    for successors in &edges {
        for &to in successors {
            in_degree[to] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for (index, &degree) in in_degree.iter().enumerate() {
        if degree == 0 {
            ready.push(Reverse(index));
        }
    }

    let mut sorted_indices = Vec::with_capacity(count);
    while let Some(Reverse(index)) = ready.pop() {
        sorted_indices.push(index);
        for &to in &edges[index] {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                ready.push(Reverse(to));
            }
        }
    }

    if sorted_indices.len() != count {
        issues.extend(report_cycles(inputs, &edges));
        return OrderOutcome {
            order: Vec::new(),
            predecessors: BTreeMap::new(),
            issues,
        };
    }

    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (from, successors) in edges.iter().enumerate() {
        for &to in successors {
            incoming[to].push(from);
        }
    }
    let predecessors: BTreeMap<String, Vec<String>> = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let mut names: Vec<String> = incoming[index]
                .iter()
                .map(|&from| inputs[from].component.id().to_string())
                .collect();
            names.sort();
            (input.component.id().to_string(), names)
        })
        .collect();

    let order: Vec<String> = sorted_indices
        .iter()
        .map(|&index| inputs[index].component.id().to_string())
        .collect();
    debug!("Computed load order for {} components", count);

    OrderOutcome {
        order,
        predecessors,
        issues,
    }
}

/// One `dependency-cycle` error per strongly-connected group
fn report_cycles(inputs: &[OrderingInput<'_>], edges: &[BTreeSet<usize>]) -> Vec<ResolutionIssue> {
    let mut reports = Vec::new();

    for group in strongly_connected_components(edges) {
        let cyclic = group.len() > 1 || edges[group[0]].contains(&group[0]);
        if !cyclic {
            continue;
        }

        let mut members: Vec<String> = group
            .iter()
            .map(|&index| inputs[index].component.id().to_string())
            .collect();
        members.sort();
        let mut archives: Vec<String> = group
            .iter()
            .map(|&index| inputs[index].archive.to_string())
            .collect();
        archives.sort();
        archives.dedup();

        warn!("Dependency cycle detected: {}", members.join(" -> "));
        reports.push((members, archives));
    }

    reports.sort();
    reports
        .into_iter()
        .map(|(members, archives)| {
            ResolutionIssue::new(IssueDetail::DependencyCycle { members, archives })
        })
        .collect()
}

/// Tarjan's algorithm over the index graph
///
/// Returns every strongly-connected component, members sorted ascending.
fn strongly_connected_components(edges: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    struct State<'a> {
        edges: &'a [BTreeSet<usize>],
        next_index: usize,
        indices: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        stack: Vec<usize>,
        on_stack: Vec<bool>,
        result: Vec<Vec<usize>>,
    }

    fn connect(state: &mut State<'_>, v: usize) {
        let v_index = state.next_index;
        state.next_index += 1;
        state.indices[v] = Some(v_index);
        state.lowlink[v] = v_index;
        state.stack.push(v);
        state.on_stack[v] = true;

        let successors: Vec<usize> = state.edges[v].iter().copied().collect();
        for w in successors {
            match state.indices[w] {
                None => {
                    connect(state, w);
                    state.lowlink[v] = state.lowlink[v].min(state.lowlink[w]);
                }
                Some(w_index) if state.on_stack[w] => {
                    state.lowlink[v] = state.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if state.lowlink[v] == v_index {
            let mut group = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                group.push(w);
                if w == v {
                    break;
                }
            }
            group.sort_unstable();
            state.result.push(group);
        }
    }

    let count = edges.len();
    let mut state = State {
        edges,
        next_index: 0,
        indices: vec![None; count],
        lowlink: vec![0; count],
        stack: Vec::new(),
        on_stack: vec![false; count],
        result: Vec::new(),
    };

    for v in 0..count {
        if state.indices[v].is_none() {
            connect(&mut state, v);
        }
    }

    state.result
}
