// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::llm::CannedPlanner;
use sqk_core::{FakeClock, SortieStatus};
use std::io;
use std::path::{Path, PathBuf};

/// Walker returning a fixed listing without touching the filesystem.
struct FixedWalker(Vec<&'static str>);

impl FileWalker for FixedWalker {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self.0.iter().map(|f| root.join(f)).collect())
    }
}

fn plan_json() -> String {
    serde_json::json!({
        "mission": {
            "title": "Refit error handling",
            "description": "Adopt the shared error helper",
            "estimated_effort_hours": 6.0
        },
        "sorties": [
            {
                "title": "Convert user handlers",
                "description": "Adopt helper in user routes",
                "scope": {"files": ["src/users.rs"]},
                "complexity": "low",
                "estimated_effort_hours": 2.0,
                "dependencies": []
            },
            {
                "title": "Convert billing handlers",
                "description": "Adopt helper in billing routes",
                "scope": {"files": ["src/billing.rs"]},
                "complexity": "medium",
                "estimated_effort_hours": 3.0,
                "dependencies": []
            },
            {
                "title": "Delete the legacy helper",
                "description": "Remove old error plumbing",
                "scope": {"files": ["src/errors.rs"]},
                "complexity": "low",
                "estimated_effort_hours": 1.0,
                "dependencies": [0, 1]
            }
        ]
    })
    .to_string()
}

fn pipeline(response: String) -> DecompositionPipeline<CannedPlanner, FixedWalker, FakeClock> {
    DecompositionPipeline::new(
        CannedPlanner::new(response),
        FixedWalker(vec!["src/users.rs", "src/billing.rs", "src/errors.rs"]),
        FakeClock::new(),
        5_000,
    )
}

#[tokio::test]
async fn full_pipeline_produces_validated_tree() {
    let pipeline = pipeline(plan_json());
    let request = DecomposeRequest::new("refactor all API handlers to use the new error helper");

    let outcome = pipeline.decompose(request).await.unwrap();

    let tree = &outcome.tree;
    assert_eq!(tree.sorties.len(), 3);
    assert_eq!(tree.mission.total_sorties, 3);
    assert_eq!(tree.mission.strategy, sqk_core::Strategy::FileBased);
    assert!(tree.sorties.iter().all(|s| s.status == SortieStatus::Pending));
    assert!(tree.sorties.iter().all(|s| s.mission_id == Some(tree.mission.id)));

    // Third sortie waits on the first two
    let cleanup = &tree.sorties[2];
    assert_eq!(cleanup.dependencies.len(), 2);
    assert_eq!(tree.dependencies.len(), 2);
    assert!(tree.dependencies.iter().all(|e| e.from == cleanup.id));
    assert!(!tree.dependencies[0].reason.is_empty());

    // Parallelization reflects the two independent sorties
    assert_eq!(tree.parallelization.parallel_groups[0].len(), 2);
    assert!(tree.parallelization.estimated_speedup > 1.0);
}

#[tokio::test]
async fn empty_task_is_rejected() {
    let pipeline = pipeline(plan_json());
    let err = pipeline.decompose(DecomposeRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyTask));
}

#[tokio::test]
async fn overlapping_plan_fails_validation() {
    let overlapping = serde_json::json!({
        "mission": {"title": "T", "description": "D", "estimated_effort_hours": 2.0},
        "sorties": [
            {
                "title": "A", "description": "a",
                "scope": {"files": ["src/shared.rs"]},
                "complexity": "low", "estimated_effort_hours": 1.0,
                "dependencies": []
            },
            {
                "title": "B", "description": "b",
                "scope": {"files": ["src/shared.rs"]},
                "complexity": "low", "estimated_effort_hours": 1.0,
                "dependencies": []
            }
        ]
    })
    .to_string();

    let pipeline = pipeline(overlapping);
    let err = pipeline.decompose(DecomposeRequest::new("do the work")).await.unwrap_err();

    match err {
        PipelineError::Validation { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, crate::validate::ValidationErrorKind::FileOverlap);
            assert_eq!(errors[0].files, vec!["src/shared.rs".to_string()]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_response_fails_as_plan_error() {
    let pipeline = pipeline("not json at all".to_string());
    let err = pipeline.decompose(DecomposeRequest::new("do the work")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Plan(PlanError::Parse(_))));
}

#[tokio::test]
async fn forced_strategy_bypasses_scoring() {
    let pipeline = pipeline(plan_json());
    let mut request = DecomposeRequest::new("do the work");
    request.strategy = Some(sqk_core::Strategy::RiskBased);

    let outcome = pipeline.decompose(request).await.unwrap();

    assert_eq!(outcome.tree.mission.strategy, sqk_core::Strategy::RiskBased);
    assert_eq!(outcome.strategy.confidence, 1.0);
}

#[tokio::test]
async fn slow_planner_times_out() {
    struct SlowPlanner;

    #[async_trait::async_trait]
    impl Planner for SlowPlanner {
        async fn plan(&self, _prompt: &str) -> Result<String, PlanError> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    let pipeline = DecompositionPipeline::new(
        SlowPlanner,
        FixedWalker(vec![]),
        FakeClock::new(),
        10,
    );
    let err = pipeline.decompose(DecomposeRequest::new("do the work")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Plan(PlanError::Timeout(10))));
}
