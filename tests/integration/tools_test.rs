//! Deterministic Tool Tests
//!
//! Cross-tool properties over the built-in rule book.

use qa_auditor_core::{Dimension, Priority, SubScores};
use qa_auditor_llm::{AnalysisRequest, HeuristicProvider, NarrativeProvider};
use qa_auditor_tools::{ComplianceMatcher, RedFlagScanner, RuleBook, ScorecardCalculator};

use crate::support::{card_readback, missing_disclosure, quiet_email};

fn tools() -> (RedFlagScanner, ComplianceMatcher, ScorecardCalculator) {
    let book = RuleBook::default();
    (
        RedFlagScanner::new(book.keywords, Default::default()),
        ComplianceMatcher::new(book.requirement_sets),
        ScorecardCalculator::new(book.weight_profiles),
    )
}

#[test]
fn test_scanner_and_matcher_agree_on_card_readback() {
    let (scanner, matcher, _) = tools();
    let transcript = card_readback("INT-1", "AG-1");

    let risk = scanner.scan(&transcript);
    assert_eq!(risk.priority, Priority::High);
    assert!(risk.risk_factors().contains(&"card_number_exposure"));

    for set in ["general", "pci_dss"] {
        let check = matcher.check(&transcript.transcript_text, set).unwrap();
        assert!(check.has_critical_violation(), "set {} missed readback", set);
    }
}

#[test]
fn test_priority_tiers_for_sample_calls() {
    let (scanner, _, _) = tools();
    assert_eq!(scanner.scan(&quiet_email("1", "A")).priority, Priority::Low);
    assert_eq!(
        scanner.scan(&missing_disclosure("2", "A")).priority,
        Priority::Medium
    );

    // same text over email needs no disclosure
    let mut email = missing_disclosure("3", "A");
    email.channel = "email".to_string();
    assert_eq!(scanner.scan(&email).priority, Priority::Low);
}

#[test]
fn test_every_profile_scores_uniform_input_exactly() {
    let (_, _, scorecard) = tools();
    let names: Vec<String> = scorecard.profiles().names().map(String::from).collect();
    assert!(names.len() >= 3);
    for name in names {
        let card = scorecard.calculate(&SubScores::uniform(73.0), &name).unwrap();
        assert_eq!(card.overall, 73.0, "profile {}", name);
        assert_eq!(card.breakdown.len(), Dimension::ALL.len());
    }
}

#[tokio::test]
async fn test_heuristic_scores_always_in_range() {
    let (scanner, matcher, scorecard) = tools();
    let provider = HeuristicProvider::new();

    for transcript in [
        card_readback("INT-1", "AG-1"),
        missing_disclosure("INT-2", "AG-1"),
        quiet_email("INT-3", "AG-2"),
    ] {
        let risk = scanner.scan(&transcript);
        let check = matcher.check(&transcript.transcript_text, "general").unwrap();
        let request = AnalysisRequest {
            interaction_id: transcript.interaction_id.clone(),
            agent_id: transcript.agent_id.clone(),
            channel: transcript.channel.clone(),
            transcript_text: transcript.transcript_text.clone(),
            customer_issue: transcript.customer_issue.clone(),
            resolution_status: transcript.resolution_status.clone(),
            requirement_set: "general".to_string(),
            findings: check.findings,
            risk_factors: risk.risk_factors().into_iter().map(String::from).collect(),
        };

        let analysis = provider.analyze_interaction(&request).await.unwrap();
        let card = scorecard
            .calculate(&analysis.sub_scores(), "compliance_heavy")
            .unwrap();
        assert!((0.0..=100.0).contains(&card.overall));
    }
}
