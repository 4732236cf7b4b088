//! Report Models
//!
//! Aggregates computed from the flow state: average scores, the compliance
//! escalation report and the structured report summary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use qa_auditor_core::{Evidence, QaEvaluation, Severity};

/// Per-dimension means over a set of evaluations (one decimal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageScores {
    pub overall: f64,
    pub compliance: f64,
    pub empathy: f64,
    pub resolution: f64,
    pub process: f64,
    /// Number of evaluations averaged
    pub count: usize,
}

impl AverageScores {
    /// Means over `evaluations`, `None` when there are none.
    pub fn from_evaluations<'a, I>(evaluations: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a QaEvaluation>,
    {
        let mut sums = [0.0f64; 5];
        let mut count = 0usize;
        for eval in evaluations {
            sums[0] += eval.overall;
            sums[1] += eval.scores.compliance;
            sums[2] += eval.scores.empathy;
            sums[3] += eval.scores.resolution;
            sums[4] += eval.scores.process;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let mean = |sum: f64| ((sum / count as f64) * 10.0).round() / 10.0;
        Some(Self {
            overall: mean(sums[0]),
            compliance: mean(sums[1]),
            empathy: mean(sums[2]),
            resolution: mean(sums[3]),
            process: mean(sums[4]),
            count,
        })
    }
}

// ============================================================================
// Escalation
// ============================================================================

/// One CRITICAL violated finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationItem {
    pub interaction_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub requirement_id: String,
    pub severity: Severity,
    pub evidence: Evidence,
    pub compliance_score: f64,
    pub overall_score: f64,
}

/// Urgent report listing every CRITICAL violation of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationReport {
    pub campaign_name: String,
    pub evaluation_period: String,
    /// Run start time
    pub generated_at: DateTime<Utc>,
    /// Ordered by interaction id, then rule order
    pub items: Vec<EscalationItem>,
    pub affected_interactions: BTreeSet<String>,
    pub affected_agents: BTreeSet<String>,
}

impl EscalationReport {
    /// Plain-text rendering written to `compliance_escalation.txt`.
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut lines = vec![
            rule.clone(),
            "       URGENT COMPLIANCE ESCALATION REPORT".to_string(),
            rule.clone(),
            format!("Campaign: {}", self.campaign_name),
            format!("Period: {}", self.evaluation_period),
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Critical Violations: {}", self.items.len()),
            format!("Affected Interactions: {}", self.affected_interactions.len()),
            format!("Affected Agents: {}", self.affected_agents.len()),
            String::new(),
        ];

        for (i, item) in self.items.iter().enumerate() {
            lines.push(format!("--- Violation #{} ---", i + 1));
            lines.push(format!("  Interaction: {}", item.interaction_id));
            lines.push(format!("  Agent: {} ({})", item.agent_name, item.agent_id));
            lines.push(format!("  Requirement: {} [{}]", item.requirement_id, item.severity));
            lines.push(format!("  Evidence: {}", item.evidence));
            lines.push(format!("  Compliance Score: {:.1}/100", item.compliance_score));
            lines.push(format!("  Overall Score: {:.1}/100", item.overall_score));
            lines.push(String::new());
        }

        lines.push(rule.clone());
        lines.push("ACTION REQUIRED: Review and remediate within 24 hours.".to_string());
        lines.push("Affected agents must be pulled from live queues until".to_string());
        lines.push("compliance retraining is completed.".to_string());
        lines.push(rule);
        lines.join("\n")
    }
}

// ============================================================================
// Report Summary
// ============================================================================

/// Structured counterpart of the executive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub transcripts_received: usize,
    pub transcripts_processed: usize,
    pub transcripts_failed: usize,
    pub deep_analyzed: usize,
    pub default_passed: usize,
    pub degraded: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_scores: Option<AverageScores>,
    pub critical_violations: usize,
    pub high_violations: usize,
    pub escalation_required: bool,
    pub patterns_identified: usize,
    pub systemic_patterns: usize,
    pub agents_needing_coaching: usize,
    pub coaching_plans: usize,
    pub fallback_plans: usize,
    pub issues: usize,
}
