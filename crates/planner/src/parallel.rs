// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parallelization analysis over a resolved dependency structure.

use crate::deps::DependencyAnalysis;
use sqk_core::{Complexity, Parallelization, Sortie};
use std::collections::HashMap;

/// Derive potential, speedup, recommendations, and bottlenecks.
pub fn analyze(sorties: &[Sortie], analysis: &DependencyAnalysis) -> Parallelization {
    let total = sorties.len();
    let max_group = analysis.parallel_groups.iter().map(Vec::len).max().unwrap_or(0);

    let parallelization_potential =
        if total <= 1 { 0.0 } else { max_group as f64 / total as f64 };

    let total_effort: f64 = sorties.iter().map(|s| s.estimated_effort_hours).sum();
    let estimated_speedup = if analysis.critical_path.is_empty()
        || analysis.critical_path_effort_hours <= 0.0
    {
        1.0
    } else {
        (total_effort / analysis.critical_path_effort_hours).max(1.0)
    };

    let mut recommendations = Vec::new();
    let mut bottlenecks = Vec::new();

    if total > 1 && parallelization_potential < 0.3 {
        recommendations.push(
            "Low parallelization potential; consider restructuring dependencies".to_string(),
        );
    }
    if analysis.critical_path.len() > total / 2 && total > 2 {
        recommendations.push(format!(
            "Critical path covers {} of {} sorties; the plan is mostly sequential",
            analysis.critical_path.len(),
            total
        ));
    }

    let avg_effort = if total == 0 { 0.0 } else { total_effort / total as f64 };
    if sorties.iter().any(|s| s.estimated_effort_hours > 2.0 * avg_effort) && total > 1 {
        recommendations
            .push("Effort is unevenly distributed; split the largest sorties".to_string());
    }

    // Fan-in: sorties more than two others wait on
    let mut dependents: HashMap<&str, usize> = HashMap::new();
    for sortie in sorties {
        for dep in &sortie.dependencies {
            *dependents.entry(dep.as_str()).or_insert(0) += 1;
        }
    }
    for sortie in sorties {
        let fan_in = dependents.get(sortie.id.as_str()).copied().unwrap_or(0);
        if fan_in > 2 {
            recommendations.push(format!(
                "Sortie {} blocks {} others; consider landing it first",
                sortie.title, fan_in
            ));
            bottlenecks.push(format!("{} has {} dependents", sortie.title, fan_in));
        }
    }

    for id in &analysis.critical_path {
        if let Some(sortie) = sorties.iter().find(|s| s.id == *id) {
            let heavy = sortie.complexity == Complexity::High
                || (total > 1 && sortie.estimated_effort_hours > 2.0 * avg_effort);
            if heavy {
                bottlenecks.push(format!(
                    "{} sits on the critical path ({} complexity, {:.1}h)",
                    sortie.title, sortie.complexity, sortie.estimated_effort_hours
                ));
            }
        }
    }

    // Singleton groups inside a longer plan are sequential stages
    if total > 1 {
        for group in &analysis.parallel_groups {
            if group.len() == 1 {
                if let Some(sortie) = sorties.iter().find(|s| s.id == group[0]) {
                    bottlenecks.push(format!("{} runs alone in its stage", sortie.title));
                }
            }
        }
    }

    Parallelization {
        parallel_groups: analysis.parallel_groups.clone(),
        critical_path: analysis.critical_path.clone(),
        estimated_duration_ms: analysis.estimated_duration_ms,
        parallelization_potential,
        estimated_speedup,
        recommendations,
        bottlenecks,
    }
}

#[cfg(test)]
#[path = "parallel_tests.rs"]
mod tests;
