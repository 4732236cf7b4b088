//! Final report compilation.
//!
//! Pure aggregation over the flow state: no new analysis, and every
//! timestamp comes from the run start so the same state always renders the
//! same text.

use tracing::info;

use qa_auditor_core::{EvaluationStatus, PatternScope, PlanSource, Severity};

use super::{advance, QaAuditorFlow};
use crate::models::{FlowStage, FlowState, ReportSummary};
use crate::utils::error::AppResult;

const TOP_PATTERNS: usize = 5;
const TOP_FACTORS: usize = 3;

/// Structured counts behind the executive summary.
pub fn compile_report_summary(state: &FlowState) -> ReportSummary {
    let count_status = |status: EvaluationStatus| {
        state
            .evaluations
            .values()
            .filter(|e| e.status == status)
            .count()
    };
    let count_violations = |severity: Severity| {
        state
            .evaluations
            .values()
            .flat_map(|e| e.violations())
            .filter(|f| f.severity == severity)
            .count()
    };

    ReportSummary {
        transcripts_received: state.transcripts_received,
        transcripts_processed: state.transcripts_processed,
        transcripts_failed: state.transcripts_failed,
        deep_analyzed: count_status(EvaluationStatus::Full) + count_status(EvaluationStatus::Degraded),
        default_passed: count_status(EvaluationStatus::DefaultPass),
        degraded: count_status(EvaluationStatus::Degraded),
        average_scores: state.average_scores,
        critical_violations: count_violations(Severity::Critical),
        high_violations: count_violations(Severity::High),
        escalation_required: state.has_critical_violations,
        patterns_identified: state.pattern_insights.len(),
        systemic_patterns: state
            .pattern_insights
            .iter()
            .filter(|i| i.scope == PatternScope::Systemic)
            .count(),
        agents_needing_coaching: state.agents_needing_coaching.len(),
        coaching_plans: state.coaching_plans.len(),
        fallback_plans: state
            .coaching_plans
            .values()
            .filter(|p| p.source == PlanSource::Fallback)
            .count(),
        issues: state.issues.len(),
    }
}

fn section(title: &str) -> String {
    let head = format!("-- {} ", title);
    let fill = 60usize.saturating_sub(head.len());
    format!("{}{}", head, "-".repeat(fill))
}

fn banner(title: &str) -> String {
    let head = format!("=== {} ", title);
    let fill = 60usize.saturating_sub(head.len());
    format!("{}{}", head, "=".repeat(fill))
}

fn score_line(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("  {:<19}{:.1}", format!("{}:", label), v),
        None => format!("  {:<19}N/A", format!("{}:", label)),
    }
}

/// Executive summary text.
pub fn render_executive_summary(state: &FlowState, summary: &ReportSummary) -> String {
    let rule = "=".repeat(60);
    let avg = summary.average_scores;
    let mut lines = vec![
        rule.clone(),
        "              QA AUDIT - EXECUTIVE SUMMARY".to_string(),
        rule,
        String::new(),
        format!("Campaign: {}", state.campaign_name),
        format!("Period: {}", state.evaluation_period),
        format!(
            "Report Generated: {}",
            state.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        String::new(),
        section("OVERVIEW"),
        format!("  Transcripts Received: {}", summary.transcripts_received),
        format!("  Successfully Processed: {}", summary.transcripts_processed),
        format!("  Failed: {}", summary.transcripts_failed),
        format!(
            "  Deep Analyzed: {} | Default Pass: {} | Degraded: {}",
            summary.deep_analyzed, summary.default_passed, summary.degraded
        ),
        String::new(),
        section("AVERAGE SCORES"),
        score_line("Overall", avg.map(|a| a.overall)),
        score_line("Compliance", avg.map(|a| a.compliance)),
        score_line("Empathy", avg.map(|a| a.empathy)),
        score_line("Resolution", avg.map(|a| a.resolution)),
        score_line("Process Adherence", avg.map(|a| a.process)),
        String::new(),
        section("COMPLIANCE"),
        format!("  Critical Violations: {}", summary.critical_violations),
        format!("  High Violations: {}", summary.high_violations),
        format!(
            "  Escalation Required: {}",
            if summary.escalation_required { "YES" } else { "No" }
        ),
        String::new(),
        section("PATTERNS & COACHING"),
        format!(
            "  Patterns Identified: {} ({} systemic)",
            summary.patterns_identified, summary.systemic_patterns
        ),
        format!(
            "  Agents Requiring Coaching: {}",
            summary.agents_needing_coaching
        ),
        format!(
            "  Coaching Plans: {} ({} fallback)",
            summary.coaching_plans, summary.fallback_plans
        ),
        String::new(),
    ];

    if !state.pattern_insights.is_empty() {
        lines.push(section("KEY PATTERNS"));
        for insight in state.pattern_insights.iter().take(TOP_PATTERNS) {
            lines.push(format!(
                "  [{}] {}",
                insight.scope.to_string().to_uppercase(),
                insight.description
            ));
        }
        lines.push(String::new());
    }

    if !state.issues.is_empty() {
        lines.push(section("ISSUES"));
        for issue in &state.issues {
            lines.push(format!("  ! {}", issue));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Executive summary followed by per-interaction and per-agent detail.
pub fn render_detailed_report(state: &FlowState, executive_summary: &str) -> String {
    let mut lines = vec![executive_summary.to_string(), String::new()];

    lines.push(banner("RISK SCORES"));
    for transcript in &state.transcripts {
        if let Some(risk) = state.risk_scores.get(&transcript.interaction_id) {
            let factors = risk.risk_factors();
            let shown: Vec<&str> = factors.iter().take(TOP_FACTORS).copied().collect();
            lines.push(format!(
                "  {}: score={:.2} priority={} factors={}",
                risk.interaction_id,
                risk.score,
                risk.priority,
                if shown.is_empty() {
                    "none".to_string()
                } else {
                    shown.join(", ")
                }
            ));
        }
    }
    lines.push(String::new());

    lines.push(banner("QA EVALUATIONS"));
    for eval in state.evaluations.values() {
        lines.push(String::new());
        lines.push(format!(
            "  --- {} (Agent: {}) [{}] ---",
            eval.interaction_id, eval.agent_id, eval.status
        ));
        lines.push(format!(
            "  Compliance: {:.1} | Empathy: {:.1} | Resolution: {:.1} | Process: {:.1}",
            eval.scores.compliance, eval.scores.empathy, eval.scores.resolution, eval.scores.process
        ));
        lines.push(format!(
            "  Overall: {:.1} | Band: {} | Profile: {}",
            eval.overall,
            eval.band.label(),
            eval.weight_profile
        ));
        let violations: Vec<String> = eval
            .violations()
            .map(|f| format!("{} [{}]", f.requirement_id, f.severity))
            .collect();
        if !violations.is_empty() {
            lines.push(format!("  Violations: {}", violations.join(", ")));
        }
        if let Some(commentary) = &eval.commentary {
            lines.push(format!("  Commentary: {}", commentary));
        }
        if !eval.strengths.is_empty() {
            lines.push(format!("  Strengths: {}", eval.strengths.join(", ")));
        }
        if !eval.improvement_areas.is_empty() {
            lines.push(format!("  Improve: {}", eval.improvement_areas.join(", ")));
        }
    }
    lines.push(String::new());

    if !state.pattern_insights.is_empty() {
        lines.push(banner("PATTERN INSIGHTS"));
        for insight in &state.pattern_insights {
            let agents: Vec<&str> = insight.affected_agents.iter().map(|a| a.as_str()).collect();
            lines.push(format!(
                "  [{}] {} ({}; agents: {}; interactions: {})",
                insight.scope.to_string().to_uppercase(),
                insight.description,
                insight.severity,
                agents.join(", "),
                insight.affected_interactions.len()
            ));
        }
        lines.push(String::new());
    }

    if !state.coaching_plans.is_empty() {
        lines.push(banner("COACHING PLANS"));
        for plan in state.coaching_plans.values() {
            lines.push(String::new());
            lines.push(format!("  --- {} ({}) ---", plan.agent_name, plan.agent_id));
            lines.push(format!(
                "  Average: {:.1} | Band: {}{}",
                plan.average_overall,
                plan.band.label(),
                if plan.source == PlanSource::Fallback {
                    " | fallback plan"
                } else {
                    ""
                }
            ));
            lines.push(format!("  Focus: {}", plan.focus_areas.join(", ")));
            for item in &plan.action_items {
                lines.push(format!("    - {}", item));
            }
            let examples: Vec<&str> = plan
                .examples
                .iter()
                .map(|e| e.interaction_id.as_str())
                .collect();
            if !examples.is_empty() {
                lines.push(format!("  Examples: {}", examples.join(", ")));
            }
            if let Some(summary) = &plan.summary {
                lines.push(format!("  Summary: {}", summary));
            }
        }
    }

    lines.join("\n")
}

impl QaAuditorFlow {
    pub(super) fn compile_final_report(&self, state: &mut FlowState) -> AppResult<()> {
        let summary = compile_report_summary(state);
        let executive_summary = render_executive_summary(state, &summary);
        let detailed_report = render_detailed_report(state, &executive_summary);

        info!(
            "[QaFlow] Report compiled: {} evaluation(s), escalation {}",
            state.evaluations.len(),
            if summary.escalation_required {
                "required"
            } else {
                "not required"
            }
        );

        state.report_summary = Some(summary);
        state.executive_summary = executive_summary;
        state.detailed_report = detailed_report;
        advance(state, FlowStage::Reported)
    }
}
