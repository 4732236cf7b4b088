//! QA Auditor Flow
//!
//! Drives one audit run through its stages:
//!
//! ```text
//! Ingested -> RiskScored -> Evaluated -> Routed -> {Escalated | SkipEscalation}
//!          -> PatternsDetected -> CoachingGenerated -> Reported
//! ```
//!
//! The flow owns the `FlowState` for the duration of a run and hands it to
//! each stage by mutable reference. Stages compute their output into locals
//! and commit it in one step, so a cancelled stage leaves the state exactly
//! as the previous stage left it.

mod coaching;
mod collaborator;
mod escalation;
mod patterns;
mod qa_analysis;
mod report;
mod risk_scoring;
mod routing;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use qa_auditor_core::Transcript;
use qa_auditor_llm::NarrativeProvider;
use qa_auditor_tools::{
    ComplianceMatcher, PatternAggregator, RedFlagScanner, RuleBook, ScorecardCalculator,
};

use crate::models::{AuditConfig, FlowStage, FlowState, IssueKind, RunIssue};
use crate::storage::TranscriptBatch;
use crate::utils::error::{AppError, AppResult};

pub use collaborator::{call_with_retry, CollaboratorFailure};
pub use escalation::build_escalation_report;
pub use report::{compile_report_summary, render_detailed_report, render_executive_summary};
pub use routing::route_by_compliance;

/// The audit pipeline: deterministic tools plus the narrative collaborator.
pub struct QaAuditorFlow {
    config: AuditConfig,
    scanner: RedFlagScanner,
    matcher: ComplianceMatcher,
    scorecard: ScorecardCalculator,
    aggregator: PatternAggregator,
    provider: Arc<dyn NarrativeProvider>,
    cancellation_token: CancellationToken,
}

impl QaAuditorFlow {
    /// Build a flow from validated configuration.
    ///
    /// Fails when the configured weight profile or default requirement set
    /// does not exist in the rule book.
    pub fn new(
        config: AuditConfig,
        rulebook: RuleBook,
        provider: Arc<dyn NarrativeProvider>,
    ) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        rulebook.validate()?;
        rulebook.weight_profiles.get(&config.run.weight_profile)?;
        rulebook
            .requirement_sets
            .get(&config.run.default_requirement_set)?;

        let RuleBook {
            keywords,
            requirement_sets,
            weight_profiles,
        } = rulebook;

        Ok(Self {
            scanner: RedFlagScanner::new(keywords, config.thresholds.risk),
            matcher: ComplianceMatcher::new(requirement_sets),
            scorecard: ScorecardCalculator::new(weight_profiles),
            aggregator: PatternAggregator::new(config.thresholds.patterns),
            provider,
            cancellation_token: CancellationToken::new(),
            config,
        })
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Token that cancels this flow's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Run the full pipeline over a batch.
    ///
    /// Returns `Err` only for fatal errors (configuration defects, or a
    /// malformed transcript under the fail-fast policy). Per-interaction
    /// problems are recorded as issues in the returned state. A cancelled run
    /// returns `Ok` with `cancelled` set and `stage` at the last completed
    /// stage.
    pub async fn run(&self, transcripts: Vec<Transcript>) -> AppResult<FlowState> {
        self.run_batch(transcripts.into()).await
    }

    /// Run the pipeline over a loaded batch.
    ///
    /// Records that failed to decode are handled at ingestion like any other
    /// malformed transcript.
    pub async fn run_batch(&self, batch: TranscriptBatch) -> AppResult<FlowState> {
        let TranscriptBatch {
            transcripts,
            rejected,
        } = batch;
        let mut state = FlowState::new(
            self.config.run.campaign_name.clone(),
            self.config.run.evaluation_period.clone(),
            transcripts,
        );
        state.transcripts_received += rejected.len();

        info!(
            "[QaFlow] Run {} started: {} transcript(s), profile '{}'",
            state.run_id, state.transcripts_received, self.config.run.weight_profile
        );

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.ingest_and_risk_score(&mut state, rejected)?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.deep_qa_analysis(&mut state).await?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.route(&mut state)?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.handle_compliance_escalation(&mut state)?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.detect_patterns(&mut state)?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.generate_coaching_plans(&mut state).await?;

        if self.interrupted(&mut state) {
            return Ok(state);
        }
        self.compile_final_report(&mut state)?;

        info!(
            "[QaFlow] Run {} complete: {} processed, {} failed, {} issue(s)",
            state.run_id,
            state.transcripts_processed,
            state.transcripts_failed,
            state.issues.len()
        );
        Ok(state)
    }

    /// Check the token between stages; on cancellation mark the state once.
    fn interrupted(&self, state: &mut FlowState) -> bool {
        if !self.cancellation_token.is_cancelled() {
            return false;
        }
        if !state.cancelled {
            warn!(
                "[QaFlow] Run {} cancelled after stage '{}'",
                state.run_id, state.stage
            );
            state.cancelled = true;
            state.record_issue(RunIssue::new(
                IssueKind::Cancelled,
                format!("run cancelled after stage '{}'", state.stage),
            ));
        }
        true
    }
}

/// Move `state` to `next`, rejecting out-of-order transitions.
fn advance(state: &mut FlowState, next: FlowStage) -> AppResult<()> {
    let current = state.stage;
    if state.advance(next) {
        info!("[QaFlow] Stage complete: {}", next);
        Ok(())
    } else {
        Err(AppError::internal(format!(
            "illegal stage transition {} -> {}",
            current, next
        )))
    }
}
