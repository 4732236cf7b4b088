//! Ingestion and risk scoring.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use qa_auditor_core::Transcript;

use super::{advance, QaAuditorFlow};
use crate::models::{FlowStage, FlowState, IssueKind, RunIssue};
use crate::utils::error::{AppError, AppResult};

impl QaAuditorFlow {
    /// Validate every transcript and scan the accepted ones.
    ///
    /// Malformed records, including `rejected` records that never decoded,
    /// are skipped and recorded unless the run is configured to fail fast.
    pub(super) fn ingest_and_risk_score(
        &self,
        state: &mut FlowState,
        rejected: Vec<RunIssue>,
    ) -> AppResult<()> {
        if self.config.run.fail_fast_on_malformed {
            if let Some(issue) = rejected.first() {
                return Err(AppError::malformed_input(issue.message.clone()));
            }
        }
        for issue in rejected {
            warn!("[QaFlow] Skipping record: {}", issue.message);
            state.record_issue(issue);
            state.transcripts_failed += 1;
        }

        let received = std::mem::take(&mut state.transcripts);
        let mut accepted: Vec<Transcript> = Vec::with_capacity(received.len());
        let mut seen: HashSet<String> = HashSet::new();
        let mut risk_scores = BTreeMap::new();

        for transcript in received {
            if let Err(reason) = self.check_transcript(&transcript, &seen) {
                if self.config.run.fail_fast_on_malformed {
                    return Err(AppError::malformed_input(reason));
                }
                warn!("[QaFlow] Skipping transcript: {}", reason);
                state.record_issue(
                    RunIssue::new(IssueKind::MalformedInput, reason)
                        .for_interaction(transcript.interaction_id.clone())
                        .for_agent(transcript.agent_id.clone()),
                );
                state.transcripts_failed += 1;
                continue;
            }

            let score = self.scanner.scan(&transcript);
            debug!(
                "[QaFlow] {} scored {:.2} ({}), factors: {:?}",
                transcript.interaction_id,
                score.score,
                score.priority,
                score.risk_factors()
            );
            seen.insert(transcript.interaction_id.clone());
            risk_scores.insert(transcript.interaction_id.clone(), score);
            accepted.push(transcript);
        }

        info!(
            "[QaFlow] Ingested {}/{} transcript(s)",
            accepted.len(),
            state.transcripts_received
        );

        state.transcripts = accepted;
        state.risk_scores = risk_scores;
        advance(state, FlowStage::RiskScored)
    }

    /// Reason a transcript cannot be accepted, if any.
    fn check_transcript(&self, transcript: &Transcript, seen: &HashSet<String>) -> Result<(), String> {
        transcript.validate().map_err(|e| e.to_string())?;

        if seen.contains(&transcript.interaction_id) {
            return Err(format!(
                "duplicate interaction_id {}; first occurrence kept",
                transcript.interaction_id
            ));
        }

        if let Some(hint) = requirement_set_hint(transcript) {
            if !self.matcher.requirement_sets().contains(hint) {
                return Err(format!(
                    "transcript {} names unknown requirement set '{}'",
                    transcript.interaction_id, hint
                ));
            }
        }
        Ok(())
    }

    /// Requirement set a transcript is checked against.
    pub(super) fn requirement_set_for<'a>(&'a self, transcript: &'a Transcript) -> &'a str {
        requirement_set_hint(transcript).unwrap_or(&self.config.run.default_requirement_set)
    }
}

/// Non-blank requirement set hint.
fn requirement_set_hint(transcript: &Transcript) -> Option<&str> {
    transcript
        .requirement_set
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
