//! Cancellation and Worker Pool Tests

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use qa_auditor::models::{CollaboratorSettings, FlowStage, IssueKind};

use crate::support::{fast_config, flow_with, missing_disclosure, Behavior, MockProvider};

#[tokio::test]
async fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    let flow = flow_with(fast_config(), MockProvider::scoring(90.0))
        .with_cancellation_token(token.clone());
    token.cancel();

    let state = flow
        .run(vec![missing_disclosure("INT-1", "AG-1")])
        .await
        .unwrap();

    assert!(state.cancelled);
    assert_eq!(state.stage, FlowStage::Ingested);
    assert!(state.risk_scores.is_empty());
    assert_eq!(state.issues_of(IssueKind::Cancelled).count(), 1);
    assert!(!state.is_complete());
}

#[tokio::test]
async fn test_cancel_during_analysis_keeps_last_stage() {
    let mut config = fast_config();
    config.collaborator = CollaboratorSettings {
        timeout_ms: 30_000,
        ..config.collaborator.clone()
    };
    let provider = MockProvider::new(
        Behavior::Slow(Duration::from_secs(10)),
        Behavior::Scores(80.0),
    );
    let flow = flow_with(config, provider.clone());

    let token = flow.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = Instant::now();
    let state = flow
        .run(vec![
            missing_disclosure("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-2"),
        ])
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(state.cancelled);
    assert_eq!(state.stage, FlowStage::RiskScored);
    assert_eq!(state.risk_scores.len(), 2);
    assert!(state.evaluations.is_empty());
    assert!(state.average_scores.is_none());
    assert!(state.orphan_ids().is_empty());

    let issues: Vec<_> = state.issues_of(IssueKind::Cancelled).collect();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("risk_scored"));
    assert!(provider.analysis_calls() >= 1);
}

#[tokio::test]
async fn test_worker_pool_is_bounded() {
    let mut config = fast_config();
    config.workers.max_parallel = 2;
    let provider = MockProvider::scoring(90.0);
    let flow = flow_with(config, provider.clone());

    let batch = (1..=6)
        .map(|i| missing_disclosure(&format!("INT-{}", i), &format!("AG-{}", i % 3)))
        .collect();
    let state = flow.run(batch).await.unwrap();

    assert_eq!(state.evaluations.len(), 6);
    assert_eq!(provider.analysis_calls(), 6);
    let peak = provider.max_in_flight.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 2, "peak concurrency was {}", peak);
    assert!(state.is_complete());
}
