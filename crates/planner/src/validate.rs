// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural validation of a decomposed plan.
//!
//! Errors block persistence; warnings ride along with the tree.

use sqk_core::{Complexity, Sortie, SortieId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    FileOverlap,
    CircularDependency,
    MissingDependency,
    InvalidScope,
}

sqk_core::simple_display! {
    ValidationErrorKind {
        FileOverlap => "file_overlap",
        CircularDependency => "circular_dependency",
        MissingDependency => "missing_dependency",
        InvalidScope => "invalid_scope",
    }
}

/// One validation failure with enough structure to act on.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub sorties: Vec<SortieId>,
    /// Overlapping files, for `FileOverlap`.
    pub files: Vec<String>,
    pub suggestion: Option<String>,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: String, sorties: Vec<SortieId>) -> Self {
        Self { kind, message, sorties, files: Vec::new(), suggestion: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

/// Run every check over the sorties of one plan.
pub fn validate_tree(sorties: &[Sortie]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_missing_dependencies(sorties, &mut errors);
    check_scopes(sorties, &mut errors);
    let cycles = find_cycles(sorties);
    for cycle in &cycles {
        let names: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
        let mut err = ValidationError::new(
            ValidationErrorKind::CircularDependency,
            format!("circular dependency: {}", names.join(" -> ")),
            cycle.clone(),
        );
        err.suggestion = Some("remove one edge of the cycle".to_string());
        errors.push(err);
    }
    // Overlap is only meaningful on an acyclic graph
    if cycles.is_empty() {
        check_file_overlap(sorties, &mut errors);
    }

    collect_warnings(sorties, &mut warnings);

    ValidationReport { valid: errors.is_empty(), errors, warnings }
}

/// Every referenced dependency must exist in the plan.
fn check_missing_dependencies(sorties: &[Sortie], errors: &mut Vec<ValidationError>) {
    let known: HashSet<&str> = sorties.iter().map(|s| s.id.as_str()).collect();
    for sortie in sorties {
        for dep in &sortie.dependencies {
            if !known.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingDependency,
                    format!("sortie {} depends on unknown sortie {}", sortie.id, dep),
                    vec![sortie.id, *dep],
                ));
            }
        }
    }
}

/// A sortie must name at least one file, component, or function.
fn check_scopes(sorties: &[Sortie], errors: &mut Vec<ValidationError>) {
    for sortie in sorties {
        if !sortie.has_scope() {
            let mut err = ValidationError::new(
                ValidationErrorKind::InvalidScope,
                format!("sortie {} ({}) has an empty scope", sortie.id, sortie.title),
                vec![sortie.id],
            );
            err.suggestion = Some("name the files this sortie will touch".to_string());
            errors.push(err);
        }
    }
}

/// Sorties with no direct dependency either way must have disjoint files.
fn check_file_overlap(sorties: &[Sortie], errors: &mut Vec<ValidationError>) {
    for (i, a) in sorties.iter().enumerate() {
        for b in sorties.iter().skip(i + 1) {
            let direct = a.dependencies.contains(&b.id) || b.dependencies.contains(&a.id);
            if direct {
                continue;
            }
            let shared: Vec<String> = a.files.intersection(&b.files).cloned().collect();
            if !shared.is_empty() {
                let mut err = ValidationError::new(
                    ValidationErrorKind::FileOverlap,
                    format!(
                        "sorties {} and {} share files without an ordering: {}",
                        a.id,
                        b.id,
                        shared.join(", ")
                    ),
                    vec![a.id, b.id],
                );
                err.files = shared;
                err.suggestion =
                    Some("merge the sorties or add a dependency edge between them".to_string());
                errors.push(err);
            }
        }
    }
}

/// Depth-first search for back-edges. Returns each cycle as
/// `[X, Y, Z, X]`, closed so the report reads as a loop.
fn find_cycles(sorties: &[Sortie]) -> Vec<Vec<SortieId>> {
    let by_id: HashMap<&str, &Sortie> = sorties.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut done: HashSet<SortieId> = HashSet::new();
    let mut cycles = Vec::new();

    for start in sorties {
        if done.contains(&start.id) {
            continue;
        }
        let mut stack: Vec<SortieId> = Vec::new();
        let mut on_stack: HashSet<SortieId> = HashSet::new();
        dfs(start, &by_id, &mut stack, &mut on_stack, &mut done, &mut cycles);
    }
    cycles
}

fn dfs(
    sortie: &Sortie,
    by_id: &HashMap<&str, &Sortie>,
    stack: &mut Vec<SortieId>,
    on_stack: &mut HashSet<SortieId>,
    done: &mut HashSet<SortieId>,
    cycles: &mut Vec<Vec<SortieId>>,
) {
    if done.contains(&sortie.id) {
        return;
    }
    stack.push(sortie.id);
    on_stack.insert(sortie.id);

    for dep in &sortie.dependencies {
        if on_stack.contains(dep) {
            // Back edge: slice the stack from the repeated node and close the loop
            if let Some(pos) = stack.iter().position(|id| id == dep) {
                let mut cycle: Vec<SortieId> = stack[pos..].to_vec();
                cycle.push(*dep);
                cycles.push(cycle);
            }
        } else if let Some(next) = by_id.get(dep.as_str()) {
            dfs(next, by_id, stack, on_stack, done, cycles);
        }
    }

    stack.pop();
    on_stack.remove(&sortie.id);
    done.insert(sortie.id);
}

/// Non-fatal observations about plan shape.
fn collect_warnings(sorties: &[Sortie], warnings: &mut Vec<String>) {
    for sortie in sorties {
        if sortie.complexity == Complexity::High {
            warnings.push(format!(
                "sortie {} ({}) is high complexity; consider splitting it",
                sortie.id, sortie.title
            ));
        }
    }

    let depth = dependency_depth(sorties);
    if depth > 5 {
        warnings.push(format!("dependency chain depth {depth} exceeds 5"));
    }

    if sorties.len() > 1 {
        let efforts: Vec<f64> = sorties.iter().map(|s| s.estimated_effort_hours).collect();
        let avg = efforts.iter().sum::<f64>() / efforts.len() as f64;
        let max = efforts.iter().cloned().fold(f64::MIN, f64::max);
        let min = efforts.iter().cloned().fold(f64::MAX, f64::min);
        if max > 2.0 * avg {
            warnings.push(format!(
                "effort distribution is top-heavy: max {max:.1}h vs average {avg:.1}h"
            ));
        }
        if min < avg / 2.0 {
            warnings.push(format!(
                "effort distribution is bottom-heavy: min {min:.1}h vs average {avg:.1}h"
            ));
        }
    }
}

/// Longest dependency chain length, counted in sorties.
fn dependency_depth(sorties: &[Sortie]) -> usize {
    let by_id: HashMap<&str, &Sortie> = sorties.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut memo: HashMap<SortieId, usize> = HashMap::new();

    fn depth_of(
        sortie: &Sortie,
        by_id: &HashMap<&str, &Sortie>,
        memo: &mut HashMap<SortieId, usize>,
        seen: &mut HashSet<SortieId>,
    ) -> usize {
        if let Some(d) = memo.get(&sortie.id) {
            return *d;
        }
        if !seen.insert(sortie.id) {
            // Cycle guard; cycles are reported elsewhere
            return 0;
        }
        let max_dep = sortie
            .dependencies
            .iter()
            .filter_map(|dep| by_id.get(dep.as_str()))
            .map(|dep| depth_of(dep, by_id, memo, seen))
            .max()
            .unwrap_or(0);
        seen.remove(&sortie.id);
        memo.insert(sortie.id, max_dep + 1);
        max_dep + 1
    }

    let mut seen = HashSet::new();
    sorties
        .iter()
        .map(|s| depth_of(s, &by_id, &mut memo, &mut seen))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
