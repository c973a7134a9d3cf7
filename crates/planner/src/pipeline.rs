// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seven-stage decomposition pipeline.
//!
//! Strategy → Codebase → TechOrders → LLMPlan → Validate →
//! ResolveDependencies → AnalyzeParallelization. The pipeline is pure with
//! respect to stores: on success it hands back a [`SortieTree`] for the
//! caller to persist; on any stage failure nothing is persisted anywhere.

use crate::codebase::{CodebaseAnalyzer, CodebaseContext, FileWalker};
use crate::llm::{self, PlanError, PlanResponse, Planner};
use crate::strategy::{self, StrategyChoice};
use crate::validate::{self, ValidationError};
use crate::{deps, parallel};
use sqk_core::{
    Clock, DependencyEdge, ErrorClass, Metadata, Mission, MissionId, Priority, Sortie, SortieId,
    SortieTree, Strategy,
};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Input to [`DecompositionPipeline::decompose`].
#[derive(Debug, Clone)]
pub struct DecomposeRequest {
    pub task_description: String,
    /// Skip scoring and use this strategy.
    pub strategy: Option<Strategy>,
    /// Root for codebase context extraction.
    pub codebase_root: Option<PathBuf>,
    /// Directory of advisory notes fed to the prompt.
    pub tech_orders_dir: Option<PathBuf>,
    pub priority: Priority,
    pub metadata: Metadata,
}

impl DecomposeRequest {
    pub fn new(task_description: impl Into<String>) -> Self {
        Self {
            task_description: task_description.into(),
            strategy: None,
            codebase_root: None,
            tech_orders_dir: None,
            priority: Priority::Medium,
            metadata: Metadata::new(),
        }
    }
}

/// Successful pipeline output.
#[derive(Debug, Clone)]
pub struct DecompositionOutcome {
    pub tree: SortieTree,
    pub strategy: StrategyChoice,
    pub context_summary: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("task description is empty")]
    EmptyTask,

    #[error("codebase analysis failed: {0}")]
    Codebase(#[from] std::io::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("plan validation failed: {summary}")]
    Validation {
        summary: String,
        errors: Vec<ValidationError>,
    },
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::EmptyTask => ErrorClass::Validation,
            PipelineError::Codebase(_) => ErrorClass::TransientIo,
            PipelineError::Plan(err) => err.class(),
            PipelineError::Validation { .. } => ErrorClass::Conflict,
        }
    }
}

/// The pipeline, parameterized over its external capabilities.
pub struct DecompositionPipeline<P: Planner, W: FileWalker, C: Clock> {
    planner: P,
    analyzer: CodebaseAnalyzer<W>,
    clock: C,
    llm_timeout_ms: u64,
}

impl<P: Planner, W: FileWalker, C: Clock> DecompositionPipeline<P, W, C> {
    pub fn new(planner: P, walker: W, clock: C, llm_timeout_ms: u64) -> Self {
        Self { planner, analyzer: CodebaseAnalyzer::new(walker), clock, llm_timeout_ms }
    }

    pub async fn decompose(
        &self,
        request: DecomposeRequest,
    ) -> Result<DecompositionOutcome, PipelineError> {
        if request.task_description.trim().is_empty() {
            return Err(PipelineError::EmptyTask);
        }

        // Stage 1: strategy
        let choice = match request.strategy {
            Some(forced) => strategy::forced_strategy(forced, &request.task_description),
            None => strategy::select_strategy(&request.task_description),
        };
        tracing::debug!(
            strategy = %choice.strategy,
            confidence = choice.confidence,
            "strategy selected"
        );

        // Stages 2–3: codebase context and tech orders
        let context = match request.codebase_root.as_deref() {
            Some(root) => self.analyzer.analyze(root, request.tech_orders_dir.as_deref())?,
            None => CodebaseContext::default(),
        };
        let context_summary = context.summary();

        // Stage 4: LLM plan, bounded by the configured deadline
        let prompt = llm::build_prompt(
            &request.task_description,
            &choice,
            &context_summary,
            &context.tech_order_summary(),
        );
        let raw = tokio::time::timeout(
            Duration::from_millis(self.llm_timeout_ms),
            self.planner.plan(&prompt),
        )
        .await
        .map_err(|_| PlanError::Timeout(self.llm_timeout_ms))??;
        let plan = llm::parse_response(&raw)?;

        // Materialize the tree before structural validation
        let (mission, sorties, dependencies) = build_entities(&plan, &request, &choice, &self.clock);

        // Stage 5: validate
        let report = validate::validate_tree(&sorties);
        if !report.valid {
            let summary = report
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PipelineError::Validation { summary, errors: report.errors });
        }

        // Stage 6: dependency resolution
        let analysis = deps::resolve(&sorties);

        // Stage 7: parallelization analysis
        let parallelization = parallel::analyze(&sorties, &analysis);

        let tree = SortieTree { mission, sorties, dependencies, parallelization };
        Ok(DecompositionOutcome {
            tree,
            strategy: choice,
            context_summary,
            warnings: report.warnings,
        })
    }
}

/// Convert the parsed plan into domain entities with fresh ids.
fn build_entities<C: Clock>(
    plan: &PlanResponse,
    request: &DecomposeRequest,
    choice: &StrategyChoice,
    clock: &C,
) -> (Mission, Vec<Sortie>, Vec<DependencyEdge>) {
    let now_ms = clock.epoch_ms();
    let mission_id = MissionId::new();

    let mut mission = Mission::new(
        mission_id,
        plan.mission.title.clone(),
        plan.mission.description.clone(),
        choice.strategy,
        request.priority,
        now_ms,
    );
    mission.total_sorties = plan.sorties.len() as u32;
    mission.metadata = request.metadata.clone();

    let ids: Vec<SortieId> = plan.sorties.iter().map(|_| SortieId::new()).collect();

    let mut sorties = Vec::with_capacity(plan.sorties.len());
    let mut dependencies = Vec::new();
    for (index, planned) in plan.sorties.iter().enumerate() {
        let mut sortie = Sortie::new(ids[index], planned.title.clone(), planned.description.clone());
        sortie.mission_id = Some(mission_id);
        sortie.priority = request.priority;
        sortie.files = planned.scope.files.iter().cloned().collect();
        sortie.complexity = planned.complexity;
        sortie.estimated_effort_hours = planned.estimated_effort_hours;
        sortie.dependencies = planned.dependencies.iter().map(|dep| ids[*dep]).collect();
        if !planned.scope.components.is_empty() {
            sortie
                .metadata
                .insert("components".to_string(), serde_json::json!(planned.scope.components));
        }
        if !planned.scope.functions.is_empty() {
            sortie
                .metadata
                .insert("functions".to_string(), serde_json::json!(planned.scope.functions));
        }

        for dep in &planned.dependencies {
            dependencies.push(DependencyEdge {
                from: ids[index],
                to: ids[*dep],
                reason: format!(
                    "{} must land before {}",
                    plan.sorties[*dep].title, planned.title
                ),
            });
        }
        sorties.push(sortie);
    }

    (mission, sorties, dependencies)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
