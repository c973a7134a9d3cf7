// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy selection from the task description.
//!
//! Each strategy has a fixed keyword set; the winner is the highest raw
//! match count, with ties broken in the declaration order below.

use regex::Regex;
use sqk_core::Strategy;
use std::sync::OnceLock;

/// Keyword sets, in tie-break order.
const STRATEGY_KEYWORDS: [(Strategy, &[&str]); 4] = [
    (
        Strategy::FileBased,
        &["refactor", "rename", "migrate", "move", "restructure", "reorganize", "cleanup", "consolidate"],
    ),
    (
        Strategy::FeatureBased,
        &["add", "implement", "create", "build", "feature", "new", "introduce", "integrate"],
    ),
    (
        Strategy::RiskBased,
        &["fix", "bug", "security", "vulnerability", "critical", "urgent", "patch", "regression"],
    ),
    (
        Strategy::ResearchBased,
        &["investigate", "explore", "research", "analyze", "understand", "evaluate", "prototype", "compare"],
    ),
];

/// High-level task patterns detected over the raw description.
const PATTERNS: [(&str, &str); 8] = [
    ("multi-file-change", r"(?i)\b(all|every|across|throughout|entire)\b"),
    ("database-change", r"(?i)\b(database|schema|migration|sql|table)s?\b"),
    ("api-change", r"(?i)\b(api|endpoint|route|handler)s?\b"),
    ("ui-change", r"(?i)\b(ui|frontend|component|style|css)s?\b"),
    ("testing-focus", r"(?i)\b(test|tests|testing|coverage|spec)\b"),
    ("performance-focus", r"(?i)\b(performance|optimi[sz]e|latency|slow)\b"),
    ("security-focus", r"(?i)\b(security|auth|authentication|vulnerabilit(y|ies))\b"),
    ("concurrency-focus", r"(?i)\b(concurren(t|cy)|parallel|race|deadlock|thread|async)\b"),
];

fn pattern_regexes() -> &'static Vec<(&'static str, Regex)> {
    static REGEXES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (*name, re)))
            .collect()
    })
}

/// Result of strategy selection.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyChoice {
    pub strategy: Strategy,
    /// `min(1, winning score / total matches × 1.5)`.
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub detected_patterns: Vec<String>,
}

/// Score the four strategies against a task description.
pub fn select_strategy(description: &str) -> StrategyChoice {
    let lower = description.to_lowercase();
    let words: Vec<&str> =
        lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

    let mut winner = Strategy::FileBased;
    let mut winner_matches: Vec<String> = Vec::new();
    let mut total_matches = 0usize;

    for (strategy, keywords) in STRATEGY_KEYWORDS {
        let matches: Vec<String> = keywords
            .iter()
            .filter(|k| words.contains(k))
            .map(|k| k.to_string())
            .collect();
        total_matches += matches.len();
        // Strict comparison keeps the declaration order as tie-break
        if matches.len() > winner_matches.len() {
            winner = strategy;
            winner_matches = matches;
        }
    }

    let normalized = winner_matches.len() as f64 / total_matches.max(1) as f64;
    let confidence = (normalized * 1.5).min(1.0);

    let detected_patterns = pattern_regexes()
        .iter()
        .filter(|(_, re)| re.is_match(description))
        .map(|(name, _)| name.to_string())
        .collect();

    StrategyChoice { strategy: winner, confidence, matched_keywords: winner_matches, detected_patterns }
}

/// A caller-forced strategy, bypassing scoring.
pub fn forced_strategy(strategy: Strategy, description: &str) -> StrategyChoice {
    let scored = select_strategy(description);
    StrategyChoice {
        strategy,
        confidence: 1.0,
        matched_keywords: Vec::new(),
        detected_patterns: scored.detected_patterns,
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
