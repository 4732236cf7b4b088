//! Deep QA analysis.
//!
//! HIGH and MEDIUM interactions get compliance matching plus narrative
//! analysis on a bounded worker pool; LOW interactions get a default pass
//! without any external call. Workers return records and this module merges
//! them into the state, one write per interaction id.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use qa_auditor_core::{
    ComplianceFinding, EvaluationStatus, QaEvaluation, RiskScore, SubScores, Transcript,
};
use qa_auditor_llm::{AnalysisRequest, LlmError};

use super::collaborator::call_with_retry;
use super::{advance, QaAuditorFlow};
use crate::models::{AverageScores, FlowStage, FlowState, RunIssue};
use crate::utils::error::{AppError, AppResult};

/// Result of analyzing one interaction.
enum AnalysisOutcome {
    Evaluated(QaEvaluation),
    Degraded(QaEvaluation, RunIssue),
}

impl AnalysisOutcome {
    fn evaluation(&self) -> &QaEvaluation {
        match self {
            AnalysisOutcome::Evaluated(eval) | AnalysisOutcome::Degraded(eval, _) => eval,
        }
    }
}

impl QaAuditorFlow {
    pub(super) async fn deep_qa_analysis(&self, state: &mut FlowState) -> AppResult<()> {
        let mut evaluations: BTreeMap<String, QaEvaluation> = BTreeMap::new();
        let mut deep: Vec<(&Transcript, &RiskScore)> = Vec::new();

        for transcript in &state.transcripts {
            let risk = state
                .risk_scores
                .get(&transcript.interaction_id)
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "no risk score for {}",
                        transcript.interaction_id
                    ))
                })?;
            if risk.priority.needs_deep_analysis() {
                deep.push((transcript, risk));
            } else {
                let eval = self.default_pass(transcript)?;
                evaluations.insert(eval.interaction_id.clone(), eval);
            }
        }

        let default_passed = evaluations.len();
        info!(
            "[QaFlow] Deep analysis of {} interaction(s), {} default pass(es), {} worker(s)",
            deep.len(),
            default_passed,
            self.config.workers.max_parallel
        );

        let outcomes: Vec<AppResult<AnalysisOutcome>> = stream::iter(
            deep.into_iter()
                .map(|(transcript, risk)| self.analyze_interaction(transcript, risk)),
        )
        .buffer_unordered(self.config.workers.max_parallel)
        .collect()
        .await;

        if self.cancellation_token.is_cancelled() {
            warn!("[QaFlow] Deep analysis interrupted; discarding partial results");
            return Ok(());
        }

        let mut issues = Vec::new();
        for outcome in outcomes {
            let outcome = outcome?;
            let id = outcome.evaluation().interaction_id.clone();
            if evaluations.contains_key(&id) {
                return Err(AppError::internal(format!(
                    "second evaluation written for {}",
                    id
                )));
            }
            match outcome {
                AnalysisOutcome::Evaluated(eval) => {
                    evaluations.insert(id, eval);
                }
                AnalysisOutcome::Degraded(eval, issue) => {
                    evaluations.insert(id, eval);
                    issues.push(issue);
                }
            }
        }

        let degraded = evaluations.values().filter(|e| e.is_degraded()).count();
        state.transcripts_processed = evaluations.len() - degraded;
        state.transcripts_failed += degraded;
        state.average_scores = AverageScores::from_evaluations(evaluations.values());
        state.evaluations = evaluations;
        for issue in issues {
            state.record_issue(issue);
        }

        if let Some(avg) = &state.average_scores {
            info!(
                "[QaFlow] {} evaluation(s), average overall {:.1}, {} degraded",
                avg.count, avg.overall, degraded
            );
        }
        advance(state, FlowStage::Evaluated)
    }

    /// Matcher plus narrative analysis for one interaction.
    async fn analyze_interaction(
        &self,
        transcript: &Transcript,
        risk: &RiskScore,
    ) -> AppResult<AnalysisOutcome> {
        let set_name = self.requirement_set_for(transcript);
        let check = self.matcher.check(&transcript.transcript_text, set_name)?;

        let request = AnalysisRequest {
            interaction_id: transcript.interaction_id.clone(),
            agent_id: transcript.agent_id.clone(),
            channel: transcript.channel.clone(),
            transcript_text: transcript.transcript_text.clone(),
            customer_issue: transcript.customer_issue.clone(),
            resolution_status: transcript.resolution_status.clone(),
            requirement_set: check.requirement_set.clone(),
            findings: check.findings.clone(),
            risk_factors: risk.risk_factors().into_iter().map(String::from).collect(),
        };

        let label = format!("analysis {}", transcript.interaction_id);
        let result = call_with_retry(
            &self.config.collaborator,
            &self.cancellation_token,
            &label,
            || {
                let provider = self.provider.clone();
                let request = request.clone();
                async move {
                    let analysis = provider.analyze_interaction(&request).await?;
                    analysis.validate()?;
                    Ok::<_, LlmError>(analysis)
                }
            },
        )
        .await;

        match result {
            Ok(analysis) => {
                let mut eval = self.evaluation(
                    transcript,
                    analysis.sub_scores(),
                    Some(check.requirement_set),
                    check.findings,
                    EvaluationStatus::Full,
                )?;
                let commentary = analysis.commentary.trim();
                if !commentary.is_empty() {
                    eval.commentary = Some(commentary.to_string());
                }
                eval.strengths = analysis.strengths;
                eval.improvement_areas = analysis.improvement_areas;
                debug!(
                    "[QaFlow] {} evaluated: overall {:.1}, {} violation(s)",
                    eval.interaction_id,
                    eval.overall,
                    eval.violations().count()
                );
                Ok(AnalysisOutcome::Evaluated(eval))
            }
            Err(failure) => {
                warn!(
                    "[QaFlow] {} degraded: narrative analysis {}",
                    transcript.interaction_id, failure
                );
                let eval = self.evaluation(
                    transcript,
                    SubScores::uniform(self.config.thresholds.degraded_score),
                    Some(check.requirement_set),
                    check.findings,
                    EvaluationStatus::Degraded,
                )?;
                let issue = RunIssue::new(
                    failure.issue_kind(),
                    format!("narrative analysis {}", failure),
                )
                .for_interaction(transcript.interaction_id.clone())
                .for_agent(transcript.agent_id.clone());
                Ok(AnalysisOutcome::Degraded(eval, issue))
            }
        }
    }

    /// Synthetic evaluation for a LOW-risk interaction.
    fn default_pass(&self, transcript: &Transcript) -> AppResult<QaEvaluation> {
        self.evaluation(
            transcript,
            SubScores::uniform(self.config.thresholds.default_pass_score),
            None,
            Vec::new(),
            EvaluationStatus::DefaultPass,
        )
    }

    fn evaluation(
        &self,
        transcript: &Transcript,
        scores: SubScores,
        requirement_set: Option<String>,
        findings: Vec<ComplianceFinding>,
        status: EvaluationStatus,
    ) -> AppResult<QaEvaluation> {
        let card = self
            .scorecard
            .calculate(&scores, &self.config.run.weight_profile)?;
        Ok(QaEvaluation {
            interaction_id: transcript.interaction_id.clone(),
            agent_id: transcript.agent_id.clone(),
            scores,
            overall: card.overall,
            weight_profile: card.weight_profile,
            band: card.band,
            requirement_set,
            findings,
            status,
            commentary: None,
            strengths: Vec::new(),
            improvement_areas: Vec::new(),
        })
    }
}
