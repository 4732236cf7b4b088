//! Flow State
//!
//! The single aggregate an audit run reads and writes. The orchestrator owns
//! it exclusively; stages receive it by mutable reference and tools only see
//! borrowed views of it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use qa_auditor_core::{CoachingPlan, PatternInsight, QaEvaluation, RiskScore, Transcript};

use super::issue::{IssueKind, RunIssue};
use super::report::{AverageScores, EscalationReport, ReportSummary};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Ingested,
    RiskScored,
    Evaluated,
    Routed,
    Escalated,
    SkipEscalation,
    PatternsDetected,
    CoachingGenerated,
    Reported,
}

impl FlowStage {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(&self, next: FlowStage) -> bool {
        use FlowStage::*;
        matches!(
            (self, next),
            (Ingested, RiskScored)
                | (RiskScored, Evaluated)
                | (Evaluated, Routed)
                | (Routed, Escalated)
                | (Routed, SkipEscalation)
                | (Escalated, PatternsDetected)
                | (SkipEscalation, PatternsDetected)
                | (PatternsDetected, CoachingGenerated)
                | (CoachingGenerated, Reported)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == FlowStage::Reported
    }
}

impl std::fmt::Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FlowStage::Ingested => "ingested",
            FlowStage::RiskScored => "risk_scored",
            FlowStage::Evaluated => "evaluated",
            FlowStage::Routed => "routed",
            FlowStage::Escalated => "escalated",
            FlowStage::SkipEscalation => "skip_escalation",
            FlowStage::PatternsDetected => "patterns_detected",
            FlowStage::CoachingGenerated => "coaching_generated",
            FlowStage::Reported => "reported",
        };
        write!(f, "{}", label)
    }
}

/// Shared state of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowState {
    /// Unique run identifier
    pub run_id: String,
    /// Run start; also stamped on generated reports
    pub started_at: DateTime<Utc>,
    pub campaign_name: String,
    pub evaluation_period: String,

    /// Number of records handed to the run
    pub transcripts_received: usize,
    /// Records that passed ingestion, in input order
    pub transcripts: Vec<Transcript>,

    pub risk_scores: BTreeMap<String, RiskScore>,
    pub evaluations: BTreeMap<String, QaEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_scores: Option<AverageScores>,

    pub has_critical_violations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_report: Option<EscalationReport>,

    pub pattern_insights: Vec<PatternInsight>,
    /// Mean overall per agent over fully analyzed evaluations
    pub agent_averages: BTreeMap<String, f64>,
    pub agents_needing_coaching: BTreeSet<String>,
    pub coaching_plans: BTreeMap<String, CoachingPlan>,

    pub executive_summary: String,
    pub detailed_report: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_summary: Option<ReportSummary>,

    /// Last completed stage
    pub stage: FlowStage,
    pub stage_history: Vec<FlowStage>,
    pub issues: Vec<RunIssue>,
    pub transcripts_processed: usize,
    pub transcripts_failed: usize,
    pub cancelled: bool,
}

impl FlowState {
    /// Fresh state holding the raw input batch.
    pub fn new(
        campaign_name: impl Into<String>,
        evaluation_period: impl Into<String>,
        transcripts: Vec<Transcript>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            campaign_name: campaign_name.into(),
            evaluation_period: evaluation_period.into(),
            transcripts_received: transcripts.len(),
            transcripts,
            risk_scores: BTreeMap::new(),
            evaluations: BTreeMap::new(),
            average_scores: None,
            has_critical_violations: false,
            escalation_report: None,
            pattern_insights: Vec::new(),
            agent_averages: BTreeMap::new(),
            agents_needing_coaching: BTreeSet::new(),
            coaching_plans: BTreeMap::new(),
            executive_summary: String::new(),
            detailed_report: String::new(),
            report_summary: None,
            stage: FlowStage::Ingested,
            stage_history: vec![FlowStage::Ingested],
            issues: Vec::new(),
            transcripts_processed: 0,
            transcripts_failed: 0,
            cancelled: false,
        }
    }

    /// Record completion of `next`. Returns false for an illegal transition.
    pub fn advance(&mut self, next: FlowStage) -> bool {
        if !self.stage.can_advance_to(next) {
            return false;
        }
        self.stage = next;
        self.stage_history.push(next);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn record_issue(&mut self, issue: RunIssue) {
        self.issues.push(issue);
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &RunIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn transcript(&self, interaction_id: &str) -> Option<&Transcript> {
        self.transcripts
            .iter()
            .find(|t| t.interaction_id == interaction_id)
    }

    /// Display name of an agent, falling back to the id.
    pub fn agent_name(&self, agent_id: &str) -> String {
        self.transcripts
            .iter()
            .find(|t| t.agent_id == agent_id)
            .map(|t| t.agent_name.clone())
            .unwrap_or_else(|| agent_id.to_string())
    }

    /// Evaluations of one agent, in interaction id order.
    pub fn evaluations_for_agent<'a>(
        &'a self,
        agent_id: &'a str,
    ) -> impl Iterator<Item = &'a QaEvaluation> + 'a {
        self.evaluations
            .values()
            .filter(move |e| e.agent_id == agent_id)
    }

    /// Interaction ids referenced anywhere in the state but absent from the
    /// accepted transcripts. Empty for every valid state.
    pub fn orphan_ids(&self) -> BTreeSet<String> {
        let known: BTreeSet<&str> = self
            .transcripts
            .iter()
            .map(|t| t.interaction_id.as_str())
            .collect();

        let mut referenced: Vec<&str> = Vec::new();
        referenced.extend(self.risk_scores.keys().map(|k| k.as_str()));
        referenced.extend(self.risk_scores.values().map(|r| r.interaction_id.as_str()));
        referenced.extend(self.evaluations.keys().map(|k| k.as_str()));
        referenced.extend(self.evaluations.values().map(|e| e.interaction_id.as_str()));
        if let Some(report) = &self.escalation_report {
            referenced.extend(report.items.iter().map(|i| i.interaction_id.as_str()));
            referenced.extend(report.affected_interactions.iter().map(|i| i.as_str()));
        }
        for insight in &self.pattern_insights {
            referenced.extend(insight.affected_interactions.iter().map(|i| i.as_str()));
        }
        for plan in self.coaching_plans.values() {
            referenced.extend(plan.examples.iter().map(|e| e.interaction_id.as_str()));
        }

        referenced
            .into_iter()
            .filter(|id| !known.contains(id))
            .map(|id| id.to_string())
            .collect()
    }
}
