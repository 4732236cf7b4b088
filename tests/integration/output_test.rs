//! Output Files and Configuration Loading

use std::fs;

use tempfile::TempDir;

use qa_auditor::models::FlowState;
use qa_auditor::storage::{
    parse_transcripts, write_outputs, ConfigService, DETAILED_REPORT_FILE, ESCALATION_FILE,
    EXECUTIVE_SUMMARY_FILE, FULL_STATE_FILE,
};
use qa_auditor::{AppError, FlowStage, QaAuditorFlow};

use crate::support::{
    card_readback, fast_config, flow_with, missing_disclosure, quiet_email, MockProvider,
};

#[tokio::test]
async fn test_outputs_without_escalation() {
    let flow = flow_with(fast_config(), MockProvider::scoring(88.0));
    let state = flow
        .run(vec![
            missing_disclosure("INT-1", "AG-1"),
            quiet_email("INT-2", "AG-2"),
        ])
        .await
        .unwrap();
    assert!(!state.has_critical_violations);

    let dir = TempDir::new().unwrap();
    let written = write_outputs(&state, dir.path()).unwrap();

    assert_eq!(written.len(), 3);
    assert!(!dir.path().join(ESCALATION_FILE).exists());

    let summary = fs::read_to_string(dir.path().join(EXECUTIVE_SUMMARY_FILE)).unwrap();
    assert_eq!(summary, state.executive_summary);
    assert!(summary.contains("Acme Support"));

    let detail = fs::read_to_string(dir.path().join(DETAILED_REPORT_FILE)).unwrap();
    assert!(detail.contains("INT-1"));
    assert!(detail.contains("INT-2"));
}

#[tokio::test]
async fn test_outputs_with_escalation() {
    let flow = flow_with(fast_config(), MockProvider::scoring(88.0));
    let state = flow
        .run(vec![
            card_readback("INT-1", "AG-1"),
            quiet_email("INT-2", "AG-2"),
        ])
        .await
        .unwrap();
    assert!(state.has_critical_violations);

    let dir = TempDir::new().unwrap();
    let written = write_outputs(&state, &dir.path().join("run")).unwrap();
    assert_eq!(written.len(), 4);

    let escalation = fs::read_to_string(dir.path().join("run").join(ESCALATION_FILE)).unwrap();
    assert!(escalation.contains("URGENT COMPLIANCE ESCALATION REPORT"));
    assert!(escalation.contains("Interaction: INT-1"));
    assert!(escalation.contains("Agent: Agent AG-1 (AG-1)"));
    assert!(!escalation.contains("INT-2"));
}

#[tokio::test]
async fn test_full_state_reloads() {
    let flow = flow_with(fast_config(), MockProvider::scoring(60.0));
    let state = flow
        .run(vec![
            missing_disclosure("INT-1", "AG-1"),
            missing_disclosure("INT-2", "AG-1"),
        ])
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    write_outputs(&state, dir.path()).unwrap();

    let json = fs::read_to_string(dir.path().join(FULL_STATE_FILE)).unwrap();
    let reloaded: FlowState = serde_json::from_str(&json).unwrap();

    assert_eq!(reloaded.run_id, state.run_id);
    assert_eq!(reloaded.stage, FlowStage::Reported);
    assert_eq!(reloaded.evaluations.len(), 2);
    assert_eq!(reloaded.coaching_plans.len(), state.coaching_plans.len());
    assert_eq!(reloaded.stage_history, state.stage_history);
}

#[tokio::test]
async fn test_config_file_with_rulebook_override() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rules.toml"),
        r#"
[[weight_profiles]]
name = "retention"
compliance = 0.25
empathy = 0.35
resolution = 0.30
process = 0.10
"#,
    )
    .unwrap();

    let config_path = dir.path().join("qa-auditor.toml");
    fs::write(
        &config_path,
        r#"
rulebook = "rules.toml"

[run]
campaign_name = "Retention Desk"
weight_profile = "retention"

[workers]
max_parallel = 2
"#,
    )
    .unwrap();

    let service = ConfigService::load(Some(&config_path)).unwrap();
    assert_eq!(service.get_config().run.campaign_name, "Retention Desk");
    let rulebook = service.rulebook().unwrap();
    assert!(rulebook.weight_profiles.contains("retention"));
    assert!(rulebook.weight_profiles.contains("standard"));

    let mut config = service.into_config();
    config.collaborator = fast_config().collaborator;
    let flow = QaAuditorFlow::new(config, rulebook, MockProvider::scoring(70.0)).unwrap();

    let batch = parse_transcripts(
        r#"{"transcripts": [{
            "interaction_id": "INT-9",
            "agent_id": "AG-9",
            "agent_name": "Sam",
            "channel": "voice",
            "transcript_text": "Agent: Hi, can you confirm your name? Customer: Sure."
        }]}"#,
    )
    .unwrap();
    assert!(batch.rejected.is_empty());
    let state = flow.run_batch(batch).await.unwrap();

    assert!(state.is_complete());
    let evaluation = &state.evaluations["INT-9"];
    assert_eq!(evaluation.weight_profile, "retention");
    assert_eq!(evaluation.overall, 70.0);
}

#[test]
fn test_missing_config_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = ConfigService::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[workers]\nmax_parallel = 0\n").unwrap();

    let err = ConfigService::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("max_parallel"));
}
