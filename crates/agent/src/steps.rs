// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyword-driven progress step templates.

use sqk_core::Rng;

/// Activities the idle loop cycles through when no task is assigned.
const IDLE_ACTIVITIES: &[&str] = &[
    "Scanning mailbox for new orders",
    "Reviewing tech orders",
    "Standing by for assignment",
    "Refreshing codebase context",
];

/// Derive the progress steps for a task description.
///
/// The first matching keyword group wins; anything unrecognized gets the
/// generic template.
pub fn steps_for(task: &str) -> Vec<String> {
    let lower = task.to_lowercase();
    let template: &[&str] = if lower.contains("implement") || lower.contains("build") {
        &[
            "Analyzing requirements",
            "Designing the change",
            "Implementing core logic",
            "Wiring integrations",
            "Verifying behavior",
        ]
    } else if lower.contains("test") {
        &[
            "Reviewing existing coverage",
            "Writing test cases",
            "Running the suite",
            "Fixing failures",
        ]
    } else if lower.contains("document") {
        &[
            "Reading the code under documentation",
            "Drafting documentation",
            "Reviewing for accuracy",
        ]
    } else if lower.contains("security") || lower.contains("audit") {
        &[
            "Mapping the attack surface",
            "Auditing sensitive paths",
            "Applying hardening fixes",
            "Re-checking the findings",
        ]
    } else if lower.contains("performance") || lower.contains("optimize") {
        &[
            "Profiling the hot paths",
            "Identifying bottlenecks",
            "Applying optimizations",
            "Measuring the improvement",
        ]
    } else {
        &["Reviewing the task", "Preparing changes", "Applying changes", "Validating results"]
    };
    template.iter().map(|s| s.to_string()).collect()
}

/// Pick a randomized idle activity.
pub fn idle_activity<R: Rng>(rng: &R) -> &'static str {
    IDLE_ACTIVITIES[rng.pick(IDLE_ACTIVITIES.len())]
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
