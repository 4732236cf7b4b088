//! Coaching plan generation.
//!
//! Each agent in the coaching set gets a curated extract of their worst
//! interactions. The narrative collaborator turns it into a plan; when it
//! fails, a rule-based plan is built from the same extract.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use qa_auditor_core::{
    CoachingExample, CoachingPlan, Dimension, PerformanceBand, PlanSource, QaEvaluation,
};
use qa_auditor_llm::{rule_based_draft, CoachingDraft, CoachingRequest, LlmError};
use qa_auditor_tools::round_one_decimal;

use super::collaborator::call_with_retry;
use super::{advance, QaAuditorFlow};
use crate::models::{FlowStage, FlowState, IssueKind, RunIssue};
use crate::utils::error::AppResult;

/// Fully analyzed evaluations first, then lowest overall, then id.
fn worst_first(a: &QaEvaluation, b: &QaEvaluation) -> std::cmp::Ordering {
    a.is_degraded()
        .cmp(&b.is_degraded())
        .then(a.overall.total_cmp(&b.overall))
        .then(a.interaction_id.cmp(&b.interaction_id))
}

/// Up to `limit` worst interactions of an agent.
pub(crate) fn curate_examples(evaluations: &[&QaEvaluation], limit: usize) -> Vec<CoachingExample> {
    let mut ranked: Vec<&QaEvaluation> = evaluations.to_vec();
    ranked.sort_by(|a, b| worst_first(a, b));
    ranked
        .into_iter()
        .take(limit)
        .map(|e| CoachingExample {
            interaction_id: e.interaction_id.clone(),
            overall: e.overall,
            weakest_dimension: e.scores.weakest(),
            violated_requirements: e.violations().map(|f| f.requirement_id.clone()).collect(),
            improvement_areas: e.improvement_areas.clone(),
        })
        .collect()
}

/// Dimensions ordered by the agent's mean score, weakest first.
///
/// Degraded evaluations are ignored unless they are all the agent has.
pub(crate) fn weakest_dimensions(evaluations: &[&QaEvaluation]) -> Vec<Dimension> {
    let analyzed: Vec<&QaEvaluation> = evaluations
        .iter()
        .copied()
        .filter(|e| !e.is_degraded())
        .collect();
    let pool = if analyzed.is_empty() {
        evaluations
    } else {
        analyzed.as_slice()
    };
    if pool.is_empty() {
        return Vec::new();
    }

    let mut means: Vec<(Dimension, f64)> = Dimension::ALL
        .iter()
        .map(|d| {
            let sum: f64 = pool.iter().map(|e| e.scores.get(*d)).sum();
            (*d, sum / pool.len() as f64)
        })
        .collect();
    means.sort_by(|a, b| a.1.total_cmp(&b.1));
    means.into_iter().map(|(d, _)| d).collect()
}

impl QaAuditorFlow {
    pub(super) async fn generate_coaching_plans(&self, state: &mut FlowState) -> AppResult<()> {
        let requests: Vec<CoachingRequest> = state
            .agents_needing_coaching
            .iter()
            .map(|agent_id| self.coaching_request(state, agent_id))
            .collect();

        info!(
            "[QaFlow] Generating {} coaching plan(s)",
            requests.len()
        );

        let results: Vec<(CoachingPlan, Option<RunIssue>)> = stream::iter(
            requests.into_iter().map(|request| self.coaching_plan(request)),
        )
        .buffer_unordered(self.config.workers.max_parallel)
        .collect()
        .await;

        if self.cancellation_token.is_cancelled() {
            warn!("[QaFlow] Coaching generation interrupted; discarding partial plans");
            return Ok(());
        }

        let mut plans = BTreeMap::new();
        for (plan, issue) in results {
            if let Some(issue) = issue {
                state.record_issue(issue);
            }
            plans.insert(plan.agent_id.clone(), plan);
        }
        state.coaching_plans = plans;
        advance(state, FlowStage::CoachingGenerated)
    }

    /// Curated extract for one agent.
    fn coaching_request(&self, state: &FlowState, agent_id: &str) -> CoachingRequest {
        let evaluations: Vec<&QaEvaluation> = state.evaluations_for_agent(agent_id).collect();

        let average_overall = match state.agent_averages.get(agent_id) {
            Some(avg) => *avg,
            None if !evaluations.is_empty() => round_one_decimal(
                evaluations.iter().map(|e| e.overall).sum::<f64>() / evaluations.len() as f64,
            ),
            None => 0.0,
        };

        let patterns = state
            .pattern_insights
            .iter()
            .filter(|i| i.affected_agents.contains(agent_id))
            .map(|i| i.description.clone())
            .collect();

        CoachingRequest {
            agent_id: agent_id.to_string(),
            agent_name: state.agent_name(agent_id),
            average_overall,
            weakest_dimensions: weakest_dimensions(&evaluations),
            patterns,
            examples: curate_examples(&evaluations, self.config.thresholds.coaching_examples),
        }
    }

    /// Generated plan, or a rule-based one plus the issue explaining why.
    async fn coaching_plan(&self, request: CoachingRequest) -> (CoachingPlan, Option<RunIssue>) {
        let label = format!("coaching {}", request.agent_id);
        let result = call_with_retry(
            &self.config.collaborator,
            &self.cancellation_token,
            &label,
            || {
                let provider = self.provider.clone();
                let request = request.clone();
                async move {
                    let draft = provider.draft_coaching_plan(&request).await?;
                    draft.validate()?;
                    Ok::<_, LlmError>(draft)
                }
            },
        )
        .await;

        match result {
            Ok(draft) => {
                debug!(
                    "[QaFlow] Coaching plan for {}: {} focus area(s)",
                    request.agent_id,
                    draft.focus_areas.len()
                );
                (build_plan(request, draft, PlanSource::Generated), None)
            }
            Err(failure) => {
                warn!(
                    "[QaFlow] Coaching generation for {} {}; using fallback plan",
                    request.agent_id, failure
                );
                let issue = RunIssue::new(
                    IssueKind::CoachingFailed,
                    format!("coaching generation {}; fallback plan used", failure),
                )
                .for_agent(request.agent_id.clone());
                let draft = rule_based_draft(&request);
                (build_plan(request, draft, PlanSource::Fallback), Some(issue))
            }
        }
    }
}

fn build_plan(request: CoachingRequest, draft: CoachingDraft, source: PlanSource) -> CoachingPlan {
    CoachingPlan {
        band: PerformanceBand::from_score(request.average_overall),
        agent_id: request.agent_id,
        agent_name: request.agent_name,
        average_overall: request.average_overall,
        focus_areas: draft.focus_areas,
        examples: request.examples,
        action_items: draft.action_items,
        summary: draft.summary,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_auditor_core::{
        ComplianceFinding, EvaluationStatus, Evidence, FindingStatus, Severity, SubScores,
    };

    fn eval(id: &str, scores: SubScores, overall: f64, status: EvaluationStatus) -> QaEvaluation {
        QaEvaluation {
            interaction_id: id.to_string(),
            agent_id: "AG-1".to_string(),
            scores,
            overall,
            weight_profile: "standard".to_string(),
            band: PerformanceBand::from_score(overall),
            requirement_set: Some("general".to_string()),
            findings: vec![ComplianceFinding {
                requirement_id: "call_recording_disclosure".to_string(),
                severity: Severity::High,
                status: FindingStatus::Violated,
                evidence: Evidence::Absent,
            }],
            status,
            commentary: None,
            strengths: Vec::new(),
            improvement_areas: vec!["Announce recording".to_string()],
        }
    }

    #[test]
    fn test_curated_examples_worst_first() {
        let a = eval("INT-1", SubScores::uniform(70.0), 70.0, EvaluationStatus::Full);
        let b = eval("INT-2", SubScores::uniform(40.0), 40.0, EvaluationStatus::Full);
        let c = eval("INT-3", SubScores::uniform(50.0), 50.0, EvaluationStatus::Degraded);
        let d = eval("INT-4", SubScores::uniform(60.0), 60.0, EvaluationStatus::Full);

        let examples = curate_examples(&[&a, &b, &c, &d], 3);
        let ids: Vec<&str> = examples.iter().map(|e| e.interaction_id.as_str()).collect();
        assert_eq!(ids, vec!["INT-2", "INT-4", "INT-1"]);
        assert_eq!(
            examples[0].violated_requirements,
            vec!["call_recording_disclosure".to_string()]
        );
    }

    #[test]
    fn test_weakest_dimensions_ignore_degraded() {
        let a = eval(
            "INT-1",
            SubScores::new(90.0, 40.0, 80.0, 70.0),
            70.0,
            EvaluationStatus::Full,
        );
        let b = eval("INT-2", SubScores::uniform(50.0), 50.0, EvaluationStatus::Degraded);
        let dims = weakest_dimensions(&[&a, &b]);
        assert_eq!(dims[0], Dimension::Empathy);
        assert_eq!(dims[1], Dimension::Process);
        assert_eq!(dims.len(), 4);
        assert!(weakest_dimensions(&[]).is_empty());
    }
}
