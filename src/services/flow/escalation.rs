//! Compliance escalation.

use std::collections::BTreeSet;

use tracing::{info, warn};

use super::{advance, QaAuditorFlow};
use crate::models::{EscalationItem, EscalationReport, FlowStage, FlowState};
use crate::utils::error::AppResult;

/// Collect every CRITICAL violated finding of the run.
///
/// Items follow interaction id order, then rule order within an
/// interaction. The report is stamped with the run start time.
pub fn build_escalation_report(state: &FlowState) -> EscalationReport {
    let mut items = Vec::new();
    let mut affected_interactions = BTreeSet::new();
    let mut affected_agents = BTreeSet::new();

    for eval in state.evaluations.values() {
        for finding in eval.critical_violations() {
            items.push(EscalationItem {
                interaction_id: eval.interaction_id.clone(),
                agent_id: eval.agent_id.clone(),
                agent_name: state.agent_name(&eval.agent_id),
                requirement_id: finding.requirement_id.clone(),
                severity: finding.severity,
                evidence: finding.evidence.clone(),
                compliance_score: eval.scores.compliance,
                overall_score: eval.overall,
            });
            affected_interactions.insert(eval.interaction_id.clone());
            affected_agents.insert(eval.agent_id.clone());
        }
    }

    EscalationReport {
        campaign_name: state.campaign_name.clone(),
        evaluation_period: state.evaluation_period.clone(),
        generated_at: state.started_at,
        items,
        affected_interactions,
        affected_agents,
    }
}

impl QaAuditorFlow {
    pub(super) fn handle_compliance_escalation(&self, state: &mut FlowState) -> AppResult<()> {
        if !state.has_critical_violations {
            state.escalation_report = None;
            return advance(state, FlowStage::SkipEscalation);
        }

        let report = build_escalation_report(state);
        warn!(
            "[QaFlow] ESCALATION: {} critical violation(s) across {} interaction(s), {} agent(s)",
            report.items.len(),
            report.affected_interactions.len(),
            report.affected_agents.len()
        );
        for item in &report.items {
            info!(
                "[QaFlow]   {} / {}: {}",
                item.interaction_id, item.agent_id, item.requirement_id
            );
        }
        state.escalation_report = Some(report);
        advance(state, FlowStage::Escalated)
    }
}
