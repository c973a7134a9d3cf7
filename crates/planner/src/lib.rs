// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sqk-planner: the decomposition pipeline.
//!
//! Strategy → Codebase → TechOrders → LLMPlan → Validate →
//! ResolveDependencies → AnalyzeParallelization. Any stage failure aborts
//! the pipeline; nothing is persisted here.

pub mod codebase;
pub mod deps;
pub mod llm;
pub mod parallel;
pub mod pipeline;
pub mod strategy;
pub mod validate;

pub use codebase::{CodebaseAnalyzer, CodebaseContext, FileWalker, FsWalker, TechOrder};
pub use deps::DependencyAnalysis;
pub use llm::{CannedPlanner, PlanError, PlanResponse, Planner};
pub use pipeline::{
    DecomposeRequest, DecompositionOutcome, DecompositionPipeline, PipelineError,
};
pub use strategy::{select_strategy, StrategyChoice};
pub use validate::{ValidationError, ValidationErrorKind, ValidationReport};
