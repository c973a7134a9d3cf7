// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The LLM planning boundary.
//!
//! The provider is an opaque `plan(prompt) → JSON text` capability. This
//! module owns the prompt shape and the strict structural validation of the
//! response; everything the model returns is untrusted until it passes
//! [`parse_response`].

use crate::strategy::StrategyChoice;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqk_core::{Complexity, ErrorClass};
use thiserror::Error;

/// External capability: produce a plan for a prompt.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, prompt: &str) -> Result<String, PlanError>;
}

/// A planner that replays a fixed response. Used by tests and dry runs.
#[derive(Clone)]
pub struct CannedPlanner {
    response: String,
}

impl CannedPlanner {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait]
impl Planner for CannedPlanner {
    async fn plan(&self, _prompt: &str) -> Result<String, PlanError> {
        Ok(self.response.clone())
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("planner timed out after {0} ms")]
    Timeout(u64),

    #[error("planner rate limited")]
    RateLimited,

    #[error("planner request failed: {0}")]
    Request(String),

    #[error("plan response is not valid JSON: {0}")]
    Parse(String),

    #[error("plan response rejected: {0}")]
    Invalid(String),
}

impl PlanError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PlanError::Timeout(_) => ErrorClass::Timeout,
            PlanError::RateLimited | PlanError::Request(_) => ErrorClass::TransientIo,
            PlanError::Parse(_) | PlanError::Invalid(_) => ErrorClass::Validation,
        }
    }
}

/// The JSON shape the prompt instructs the model to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub mission: PlanMission,
    pub sorties: Vec<PlanSortie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMission {
    pub title: String,
    pub description: String,
    pub estimated_effort_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSortie {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub scope: PlanScope,
    pub complexity: Complexity,
    pub estimated_effort_hours: f64,
    /// 0-based indices into the sorties array.
    #[serde(default)]
    pub dependencies: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelizable: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanScope {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl PlanScope {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.components.is_empty() && self.functions.is_empty()
    }
}

/// Assemble the planning prompt: task, strategy, codebase context, tech orders.
pub fn build_prompt(
    task_description: &str,
    strategy: &StrategyChoice,
    codebase_summary: &str,
    tech_order_summary: &str,
) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a mission planner decomposing work for a fleet of specialist workers.\n\n");
    prompt.push_str(&format!("Task:\n{task_description}\n\n"));
    prompt.push_str(&format!(
        "Decomposition strategy: {} (confidence {:.2})\n",
        strategy.strategy, strategy.confidence
    ));
    if !strategy.detected_patterns.is_empty() {
        prompt.push_str(&format!("Detected patterns: {}\n", strategy.detected_patterns.join(", ")));
    }
    prompt.push_str(&format!("\nCodebase context:\n{codebase_summary}\n"));
    if !tech_order_summary.is_empty() {
        prompt.push_str(&format!("\n{tech_order_summary}\n"));
    }
    prompt.push_str(concat!(
        "\nReturn STRICT JSON, no prose and no code fences, with this shape:\n",
        "{\n",
        "  \"mission\": {\"title\": str, \"description\": str, \"estimated_effort_hours\": number > 0},\n",
        "  \"sorties\": [{\n",
        "    \"title\": str, \"description\": str,\n",
        "    \"scope\": {\"files\": [str], \"components\": [str], \"functions\": [str]},\n",
        "    \"complexity\": \"low\" | \"medium\" | \"high\",\n",
        "    \"estimated_effort_hours\": number > 0,\n",
        "    \"dependencies\": [0-based indices into sorties],\n",
        "    \"parallelizable\": bool (optional)\n",
        "  }]\n",
        "}\n",
        "Sorties that can run concurrently must not share files.\n",
    ));
    prompt
}

/// Strip code fences, parse, and reject structurally invalid plans.
pub fn parse_response(raw: &str) -> Result<PlanResponse, PlanError> {
    let stripped = strip_code_fences(raw);
    let plan: PlanResponse =
        serde_json::from_str(stripped).map_err(|e| PlanError::Parse(e.to_string()))?;

    if plan.mission.title.trim().is_empty() {
        return Err(PlanError::Invalid("mission title is empty".to_string()));
    }
    if plan.mission.description.trim().is_empty() {
        return Err(PlanError::Invalid("mission description is empty".to_string()));
    }
    if plan.mission.estimated_effort_hours <= 0.0 {
        return Err(PlanError::Invalid("mission effort must be positive".to_string()));
    }
    if plan.sorties.is_empty() {
        return Err(PlanError::Invalid("plan contains no sorties".to_string()));
    }

    for (index, sortie) in plan.sorties.iter().enumerate() {
        if sortie.title.trim().is_empty() {
            return Err(PlanError::Invalid(format!("sortie {index} has no title")));
        }
        if sortie.description.trim().is_empty() {
            return Err(PlanError::Invalid(format!("sortie {index} has no description")));
        }
        if sortie.scope.is_empty() {
            return Err(PlanError::Invalid(format!("sortie {index} names no files")));
        }
        if sortie.estimated_effort_hours <= 0.0 {
            return Err(PlanError::Invalid(format!("sortie {index} effort must be positive")));
        }
        for dep in &sortie.dependencies {
            if *dep >= plan.sorties.len() {
                return Err(PlanError::Invalid(format!(
                    "sortie {index} dependency {dep} is out of range"
                )));
            }
            if *dep == index {
                return Err(PlanError::Invalid(format!("sortie {index} depends on itself")));
            }
        }
    }

    Ok(plan)
}

/// Drop leading/trailing markdown fences (` ``` ` or ` ```json `).
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
