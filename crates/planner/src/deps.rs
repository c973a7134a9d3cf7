// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency resolution: topological order, parallel layers, critical path.

use sqk_core::{Sortie, SortieId};
use std::collections::{HashMap, HashSet};

/// Output of the dependency resolver.
#[derive(Debug, Clone, Default)]
pub struct DependencyAnalysis {
    /// Dependencies-first execution order.
    pub topo_order: Vec<SortieId>,
    /// Greedy layers of mutually parallel sorties.
    pub parallel_groups: Vec<Vec<SortieId>>,
    /// Longest chain by sortie count.
    pub critical_path: Vec<SortieId>,
    pub critical_path_effort_hours: f64,
    /// Critical-path effort converted to milliseconds.
    pub estimated_duration_ms: u64,
    pub max_depth: usize,
    /// Populated defensively; a validated tree has none.
    pub cycles: Vec<Vec<SortieId>>,
}

/// Resolve the dependency structure of a validated (acyclic) plan.
pub fn resolve(sorties: &[Sortie]) -> DependencyAnalysis {
    let by_id: HashMap<&str, &Sortie> = sorties.iter().map(|s| (s.id.as_str(), s)).collect();

    let cycles = crate::validate::validate_tree(sorties)
        .errors
        .into_iter()
        .filter(|e| e.kind == crate::validate::ValidationErrorKind::CircularDependency)
        .map(|e| e.sorties)
        .collect::<Vec<_>>();

    let topo_order = topo_sort(sorties, &by_id);
    let ancestors = transitive_dependencies(&topo_order, &by_id);
    let parallel_groups = group_parallel(&topo_order, &by_id, &ancestors);
    let (critical_path, max_depth) = critical_path(&topo_order, &by_id);

    let critical_path_effort_hours: f64 = critical_path
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|s| s.estimated_effort_hours)
        .sum();

    DependencyAnalysis {
        topo_order,
        parallel_groups,
        critical_path,
        critical_path_effort_hours,
        estimated_duration_ms: (critical_path_effort_hours * 3_600_000.0) as u64,
        max_depth,
        cycles,
    }
}

/// DFS post-order: every sortie appears after all of its dependencies.
fn topo_sort(sorties: &[Sortie], by_id: &HashMap<&str, &Sortie>) -> Vec<SortieId> {
    let mut order = Vec::new();
    let mut visited: HashSet<SortieId> = HashSet::new();
    let mut in_progress: HashSet<SortieId> = HashSet::new();

    fn visit(
        sortie: &Sortie,
        by_id: &HashMap<&str, &Sortie>,
        visited: &mut HashSet<SortieId>,
        in_progress: &mut HashSet<SortieId>,
        order: &mut Vec<SortieId>,
    ) {
        if visited.contains(&sortie.id) || !in_progress.insert(sortie.id) {
            return;
        }
        for dep in &sortie.dependencies {
            if let Some(next) = by_id.get(dep.as_str()) {
                visit(next, by_id, visited, in_progress, order);
            }
        }
        in_progress.remove(&sortie.id);
        visited.insert(sortie.id);
        order.push(sortie.id);
    }

    for sortie in sorties {
        visit(sortie, by_id, &mut visited, &mut in_progress, &mut order);
    }
    order
}

/// Transitive dependency closure, computed along the topological order.
fn transitive_dependencies(
    topo_order: &[SortieId],
    by_id: &HashMap<&str, &Sortie>,
) -> HashMap<SortieId, HashSet<SortieId>> {
    let mut ancestors: HashMap<SortieId, HashSet<SortieId>> = HashMap::new();
    for id in topo_order {
        let Some(sortie) = by_id.get(id.as_str()) else { continue };
        let mut set: HashSet<SortieId> = HashSet::new();
        for dep in &sortie.dependencies {
            set.insert(*dep);
            if let Some(dep_ancestors) = ancestors.get(dep) {
                set.extend(dep_ancestors.iter().copied());
            }
        }
        ancestors.insert(*id, set);
    }
    ancestors
}

/// Greedy layering: a sortie joins an existing group iff it can run in
/// parallel with every current member: no dependency path in either
/// direction and no file overlap.
fn group_parallel(
    topo_order: &[SortieId],
    by_id: &HashMap<&str, &Sortie>,
    ancestors: &HashMap<SortieId, HashSet<SortieId>>,
) -> Vec<Vec<SortieId>> {
    let mut groups: Vec<Vec<SortieId>> = Vec::new();

    let independent = |a: &SortieId, b: &SortieId| -> bool {
        let a_reaches_b = ancestors.get(a).is_some_and(|set| set.contains(b));
        let b_reaches_a = ancestors.get(b).is_some_and(|set| set.contains(a));
        if a_reaches_b || b_reaches_a {
            return false;
        }
        match (by_id.get(a.as_str()), by_id.get(b.as_str())) {
            (Some(sa), Some(sb)) => sa.files.is_disjoint(&sb.files),
            _ => true,
        }
    };

    for id in topo_order {
        let slot = groups
            .iter_mut()
            .find(|group| group.iter().all(|member| independent(member, id)));
        match slot {
            Some(group) => group.push(*id),
            None => groups.push(vec![*id]),
        }
    }
    groups
}

/// Longest chain by count, with its depth.
fn critical_path(
    topo_order: &[SortieId],
    by_id: &HashMap<&str, &Sortie>,
) -> (Vec<SortieId>, usize) {
    let mut depth: HashMap<SortieId, usize> = HashMap::new();
    let mut predecessor: HashMap<SortieId, SortieId> = HashMap::new();

    for id in topo_order {
        let Some(sortie) = by_id.get(id.as_str()) else { continue };
        let best = sortie
            .dependencies
            .iter()
            .filter_map(|dep| depth.get(dep).map(|d| (*d, *dep)))
            .max_by_key(|(d, _)| *d);
        match best {
            Some((d, dep)) => {
                depth.insert(*id, d + 1);
                predecessor.insert(*id, dep);
            }
            None => {
                depth.insert(*id, 1);
            }
        }
    }

    let Some((tail, max_depth)) = depth.iter().max_by_key(|(_, d)| **d).map(|(id, d)| (*id, *d))
    else {
        return (Vec::new(), 0);
    };

    let mut path = vec![tail];
    let mut current = tail;
    while let Some(prev) = predecessor.get(&current) {
        path.push(*prev);
        current = *prev;
    }
    path.reverse();
    (path, max_depth)
}

#[cfg(test)]
#[path = "deps_tests.rs"]
mod tests;
