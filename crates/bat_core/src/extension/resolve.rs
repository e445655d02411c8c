//! Registration order resolution (Kahn's algorithm).
//!
//! # Responsibility
//! - Produce a registration order where every requirement precedes its
//!   dependents.
//! - Classify failures as missing dependency or cycle.
//!
//! # Invariants
//! - Ties between independently eligible extensions are broken by input
//!   order; the result is a pure function of the input sequence.
//! - A missing dependency is reported in preference to a cycle.

use crate::error::{BootstrapError, BootstrapResult};
use crate::extension::graph::DependencyGraph;
use crate::extension::ExtensionId;
use log::{debug, error};
use std::collections::VecDeque;

/// Resolves the registration order of `graph`.
///
/// Returns input positions in registration order.
///
/// # Errors
/// - `MissingDependency` when an unresolved extension requires a kind that
///   was not supplied.
/// - `CyclicDependency` when all unresolved requirements were supplied but
///   form a cycle.
pub fn resolve_order(graph: &DependencyGraph<'_>) -> BootstrapResult<Vec<usize>> {
    let mut in_degree = graph.in_degrees().to_vec();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(position, _)| position)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(position) = queue.pop_front() {
        order.push(position);
        let id = graph.node(position).id;
        for &dependent in graph.dependents_of(id) {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() == graph.len() {
        debug!(
            "event=extension_resolve module=extension status=ok count={}",
            order.len()
        );
        return Ok(order);
    }

    let err = classify_failure(graph, &order);
    error!(
        "event=extension_resolve module=extension status=error resolved={} total={} error={}",
        order.len(),
        graph.len(),
        err
    );
    Err(err)
}

fn classify_failure(graph: &DependencyGraph<'_>, order: &[usize]) -> BootstrapError {
    let mut resolved = vec![false; graph.len()];
    for &position in order {
        resolved[position] = true;
    }

    let unresolved: Vec<usize> = (0..graph.len())
        .filter(|position| !resolved[*position])
        .collect();

    for &position in &unresolved {
        let node = graph.node(position);
        for requirement in &node.requirements {
            if graph.position_of(*requirement).is_none() {
                return BootstrapError::MissingDependency {
                    extension: node.id,
                    requirement: *requirement,
                };
            }
        }
    }

    BootstrapError::CyclicDependency {
        unresolved: unresolved
            .iter()
            .map(|position| graph.node(*position).id)
            .collect(),
        cycle: find_cycle(graph, &resolved, unresolved[0]),
    }
}

/// Walks unresolved requirements from `start` until a node repeats.
///
/// Every unresolved node with no missing requirement has at least one
/// unresolved requirement, so the walk always closes within `len` steps.
fn find_cycle(graph: &DependencyGraph<'_>, resolved: &[bool], start: usize) -> Vec<ExtensionId> {
    let mut path: Vec<usize> = Vec::new();
    let mut current = start;

    loop {
        if let Some(index) = path.iter().position(|position| *position == current) {
            let mut cycle: Vec<ExtensionId> = path[index..]
                .iter()
                .map(|position| graph.node(*position).id)
                .collect();
            cycle.push(graph.node(current).id);
            return cycle;
        }
        path.push(current);

        let next = graph.node(current).requirements.iter().find_map(|requirement| {
            graph
                .position_of(*requirement)
                .filter(|position| !resolved[*position])
        });
        match next {
            Some(position) => current = position,
            None => {
                return path.iter().map(|position| graph.node(*position).id).collect();
            }
        }
    }
}
