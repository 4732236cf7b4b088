//! Full Pipeline Tests
//!
//! End-to-end runs of `QaAuditorFlow` over small batches.

use std::sync::Arc;
use std::time::Duration;

use qa_auditor::models::{FlowStage, IssueKind};
use qa_auditor::services::flow::route_by_compliance;
use qa_auditor::storage::parse_transcripts;
use qa_auditor::{AppError, QaAuditorFlow};
use qa_auditor_core::{
    EvaluationStatus, FindingStatus, PatternKey, PatternScope, PlanSource, Priority, Severity,
    Transcript,
};
use qa_auditor_llm::{HeuristicProvider, LlmError};
use qa_auditor_tools::RuleBook;

use crate::support::{
    card_readback, fast_config, flow_with, missing_disclosure, quiet_email, Behavior, MockProvider,
};

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_card_readback_escalates() {
    let flow = flow_with(fast_config(), Arc::new(HeuristicProvider::new()));
    let state = flow
        .run(vec![card_readback("INT-1", "AG-1"), quiet_email("INT-2", "AG-2")])
        .await
        .unwrap();

    assert_eq!(state.risk_scores["INT-1"].priority, Priority::High);
    assert!(state.risk_scores["INT-1"].has_critical_flag());

    let eval = &state.evaluations["INT-1"];
    assert_eq!(eval.status, EvaluationStatus::Full);
    let critical: Vec<_> = eval.critical_violations().collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].requirement_id, "full_card_readback");
    assert_eq!(critical[0].status, FindingStatus::Violated);

    assert!(state.has_critical_violations);
    let report = state.escalation_report.as_ref().unwrap();
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].agent_name, "Agent AG-1");
    assert_eq!(report.generated_at, state.started_at);
    assert!(report.affected_interactions.contains("INT-1"));

    assert!(state.stage_history.contains(&FlowStage::Escalated));
    assert!(!state.stage_history.contains(&FlowStage::SkipEscalation));
    assert!(state.is_complete());
    assert!(state.executive_summary.contains("Escalation Required: YES"));
}

#[tokio::test]
async fn test_low_priority_gets_default_pass() {
    let provider = MockProvider::scoring(95.0);
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow
        .run(vec![quiet_email("INT-1", "AG-1"), quiet_email("INT-2", "AG-1")])
        .await
        .unwrap();

    assert_eq!(provider.analysis_calls(), 0);
    for eval in state.evaluations.values() {
        assert_eq!(eval.status, EvaluationStatus::DefaultPass);
        assert!(eval.findings.is_empty());
        assert_eq!(eval.overall, 80.0);
        assert!(eval.requirement_set.is_none());
    }
    assert!(!state.has_critical_violations);
    assert!(state.escalation_report.is_none());
    assert_eq!(state.stage_history[4], FlowStage::SkipEscalation);
    assert_eq!(state.transcripts_processed, 2);
}

#[tokio::test]
async fn test_shared_missing_disclosure_is_one_systemic_insight() {
    let provider = MockProvider::scoring(90.0);
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow
        .run(vec![
            missing_disclosure("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-1"),
            missing_disclosure("INT-3", "AG-2"),
            missing_disclosure("INT-4", "AG-2"),
        ])
        .await
        .unwrap();

    for risk in state.risk_scores.values() {
        assert_eq!(risk.priority, Priority::Medium);
    }
    assert_eq!(provider.analysis_calls(), 4);

    assert_eq!(state.pattern_insights.len(), 1);
    let insight = &state.pattern_insights[0];
    assert_eq!(insight.scope, PatternScope::Systemic);
    assert_eq!(
        insight.key,
        PatternKey::Violation {
            requirement_id: "call_recording_disclosure".to_string()
        }
    );
    assert_eq!(insight.severity, Severity::High);
    assert!(insight.agent_id.is_none());
    assert!(insight.affected_agents.contains("AG-1"));
    assert!(insight.affected_agents.contains("AG-2"));
    assert_eq!(insight.affected_interactions.len(), 4);

    assert_eq!(state.agents_needing_coaching.len(), 2);
    assert_eq!(state.coaching_plans.len(), 2);
    assert!(state
        .coaching_plans
        .values()
        .all(|p| p.source == PlanSource::Generated));
    assert_eq!(provider.coaching_calls(), 2);
}

#[tokio::test]
async fn test_empty_batch_completes() {
    let flow = flow_with(fast_config(), MockProvider::scoring(90.0));
    let state = flow.run(Vec::new()).await.unwrap();

    assert!(state.is_complete());
    assert!(state.evaluations.is_empty());
    assert!(state.average_scores.is_none());
    assert!(!state.has_critical_violations);
    assert!(state.pattern_insights.is_empty());
    assert!(state.coaching_plans.is_empty());
    assert!(state.orphan_ids().is_empty());
    assert!(state.executive_summary.contains("Transcripts Received: 0"));
    assert_eq!(state.report_summary.as_ref().unwrap().transcripts_received, 0);
}

#[tokio::test]
async fn test_no_orphans_in_final_state() {
    let flow = flow_with(fast_config(), Arc::new(HeuristicProvider::new()));

    let single = flow.run(vec![card_readback("INT-1", "AG-1")]).await.unwrap();
    assert!(single.orphan_ids().is_empty());

    let batch = flow
        .run(vec![
            card_readback("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-1"),
            missing_disclosure("INT-3", "AG-2"),
            quiet_email("INT-4", "AG-2"),
        ])
        .await
        .unwrap();
    assert!(batch.orphan_ids().is_empty());
    assert_eq!(batch.evaluations.len(), 4);
    assert_eq!(
        batch.has_critical_violations,
        route_by_compliance(&batch.evaluations)
    );
}

// ============================================================================
// Malformed input and configuration
// ============================================================================

#[tokio::test]
async fn test_malformed_transcripts_are_skipped() {
    let flow = flow_with(fast_config(), MockProvider::scoring(90.0));
    let mut missing_name = quiet_email("INT-2", "AG-1");
    missing_name.agent_name = String::new();
    let unknown_set = quiet_email("INT-4", "AG-1").with_requirement_set("mortgage");

    let state = flow
        .run(vec![
            quiet_email("INT-1", "AG-1"),
            missing_name,
            quiet_email("INT-1", "AG-9"),
            unknown_set,
        ])
        .await
        .unwrap();

    assert_eq!(state.transcripts_received, 4);
    assert_eq!(state.transcripts.len(), 1);
    assert_eq!(state.evaluations["INT-1"].agent_id, "AG-1");
    assert_eq!(state.transcripts_failed, 3);
    assert_eq!(state.issues_of(IssueKind::MalformedInput).count(), 3);
    assert!(state.is_complete());
    assert!(state.executive_summary.contains("[malformed_input]"));
}

#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let mut config = fast_config();
    config.run.fail_fast_on_malformed = true;
    let flow = flow_with(config, MockProvider::scoring(90.0));

    let mut broken = quiet_email("INT-2", "AG-1");
    broken.transcript_text = "   ".to_string();
    let err = flow
        .run(vec![quiet_email("INT-1", "AG-1"), broken])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MalformedInput(ref m) if m.contains("transcript_text")));
}

const MIXED_BATCH: &str = r#"{"transcripts": [
    {"interaction_id": "INT-1", "agent_id": "AG-1", "agent_name": "Sam",
     "channel": "email", "transcript_text": "Thanks, your refund has been processed."},
    {"interaction_id": "INT-2", "agent_id": null, "agent_name": "Kim",
     "channel": "voice", "transcript_text": "Hello there"}
]}"#;

#[tokio::test]
async fn test_undecodable_record_is_skipped_not_fatal() {
    let flow = flow_with(fast_config(), MockProvider::scoring(90.0));

    let batch = parse_transcripts(MIXED_BATCH).unwrap();
    let state = flow.run_batch(batch).await.unwrap();

    assert!(state.is_complete());
    assert_eq!(state.transcripts_received, 2);
    assert_eq!(state.transcripts.len(), 1);
    assert_eq!(state.evaluations.len(), 1);
    assert!(state.evaluations.contains_key("INT-1"));
    assert_eq!(state.transcripts_failed, 1);

    let issues: Vec<_> = state.issues_of(IssueKind::MalformedInput).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].interaction_id.as_deref(), Some("INT-2"));
    assert!(state.executive_summary.contains("[malformed_input]"));
}

#[tokio::test]
async fn test_undecodable_record_under_fail_fast() {
    let mut config = fast_config();
    config.run.fail_fast_on_malformed = true;
    let flow = flow_with(config, MockProvider::scoring(90.0));

    let batch = parse_transcripts(MIXED_BATCH).unwrap();
    let err = flow.run_batch(batch).await.unwrap_err();
    assert!(matches!(err, AppError::MalformedInput(ref m) if m.contains("INT-2")));
}

#[test]
fn test_unknown_profile_or_set_fails_construction() {
    let mut config = fast_config();
    config.run.weight_profile = "aggressive".to_string();
    let result = QaAuditorFlow::new(config, RuleBook::default(), MockProvider::scoring(90.0));
    assert!(matches!(result, Err(AppError::ToolConfig(_))));

    let mut config = fast_config();
    config.run.default_requirement_set = "mortgage".to_string();
    let result = QaAuditorFlow::new(config, RuleBook::default(), MockProvider::scoring(90.0));
    assert!(matches!(result, Err(AppError::ToolConfig(_))));
}

#[tokio::test]
async fn test_requirement_set_hint_is_used() {
    let flow = flow_with(fast_config(), MockProvider::scoring(90.0));
    let transcript = card_readback("INT-1", "AG-1").with_requirement_set("pci_dss");
    let state = flow.run(vec![transcript]).await.unwrap();

    let eval = &state.evaluations["INT-1"];
    assert_eq!(eval.requirement_set.as_deref(), Some("pci_dss"));
    let ids: Vec<&str> = eval
        .critical_violations()
        .map(|f| f.requirement_id.as_str())
        .collect();
    assert_eq!(ids, vec!["card_number_spoken"]);
}

// ============================================================================
// Degraded analysis and coaching fallback
// ============================================================================

#[tokio::test]
async fn test_failed_analysis_degrades_but_still_routes() {
    let provider = MockProvider::new(
        Behavior::Fail(LlmError::ServerError {
            message: "upstream unavailable".to_string(),
            status: Some(503),
        }),
        Behavior::Scores(80.0),
    );
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow
        .run(vec![card_readback("INT-1", "AG-1"), quiet_email("INT-2", "AG-2")])
        .await
        .unwrap();

    // first attempt plus one retry
    assert_eq!(provider.analysis_calls(), 2);

    let eval = &state.evaluations["INT-1"];
    assert_eq!(eval.status, EvaluationStatus::Degraded);
    assert_eq!(eval.scores.empathy, 50.0);
    assert!(eval.has_critical_violation());
    assert!(state.has_critical_violations);
    assert!(state.escalation_report.is_some());

    let issues: Vec<_> = state.issues_of(IssueKind::CollaboratorFailed).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].interaction_id.as_deref(), Some("INT-1"));
    assert_eq!(state.transcripts_processed, 1);
    assert_eq!(state.transcripts_failed, 1);
    assert_eq!(state.report_summary.as_ref().unwrap().degraded, 1);
    assert!(state.detailed_report.contains("degraded (analysis incomplete)"));
}

#[tokio::test]
async fn test_invalid_analysis_is_not_retried() {
    let provider = MockProvider::new(Behavior::Scores(140.0), Behavior::Scores(80.0));
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow.run(vec![missing_disclosure("INT-1", "AG-1")]).await.unwrap();

    assert_eq!(provider.analysis_calls(), 1);
    assert_eq!(state.evaluations["INT-1"].status, EvaluationStatus::Degraded);
    assert_eq!(state.issues_of(IssueKind::CollaboratorInvalid).count(), 1);
}

#[tokio::test]
async fn test_slow_analysis_times_out() {
    let provider = MockProvider::new(
        Behavior::Slow(Duration::from_secs(5)),
        Behavior::Scores(80.0),
    );
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow.run(vec![missing_disclosure("INT-1", "AG-1")]).await.unwrap();

    assert_eq!(provider.analysis_calls(), 2);
    assert_eq!(state.evaluations["INT-1"].status, EvaluationStatus::Degraded);
    assert_eq!(state.issues_of(IssueKind::CollaboratorTimeout).count(), 1);
    assert!(state.is_complete());
}

#[tokio::test]
async fn test_coaching_failure_uses_fallback_plan() {
    let provider = MockProvider::new(
        Behavior::Scores(55.0),
        Behavior::Fail(LlmError::InvalidRequest {
            message: "context too long".to_string(),
        }),
    );
    let flow = flow_with(fast_config(), provider.clone());
    let state = flow
        .run(vec![
            missing_disclosure("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-1"),
        ])
        .await
        .unwrap();

    let plan = &state.coaching_plans["AG-1"];
    assert_eq!(plan.source, PlanSource::Fallback);
    assert_eq!(plan.agent_name, "Agent AG-1");
    assert!(plan.average_overall < 70.0);
    assert!(!plan.focus_areas.is_empty());
    assert!(!plan.action_items.is_empty());
    assert!(plan
        .focus_areas
        .iter()
        .any(|f| f == "Compliance: call_recording_disclosure"));
    assert_eq!(plan.examples.len(), 2);

    let issues: Vec<_> = state.issues_of(IssueKind::CoachingFailed).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].agent_id.as_deref(), Some("AG-1"));
    assert_eq!(state.report_summary.as_ref().unwrap().fallback_plans, 1);
}

#[tokio::test]
async fn test_evaluations_are_reproducible() {
    let flow = flow_with(fast_config(), Arc::new(HeuristicProvider::new()));
    let batch = || -> Vec<Transcript> {
        vec![
            card_readback("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-2"),
            quiet_email("INT-3", "AG-2"),
        ]
    };

    let first = flow.run(batch()).await.unwrap();
    let second = flow.run(batch()).await.unwrap();
    assert_eq!(first.evaluations, second.evaluations);
    assert_eq!(first.pattern_insights, second.pattern_insights);
    assert_eq!(first.report_summary, second.report_summary);
}
