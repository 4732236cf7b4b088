//! Pattern detection.

use tracing::{debug, info};

use super::{advance, QaAuditorFlow};
use crate::models::{FlowStage, FlowState};
use crate::utils::error::AppResult;

impl QaAuditorFlow {
    pub(super) fn detect_patterns(&self, state: &mut FlowState) -> AppResult<()> {
        let report = self.aggregator.aggregate(state.evaluations.values());

        for insight in &report.insights {
            debug!(
                "[QaFlow] Pattern [{}] {}: {}",
                insight.scope, insight.key, insight.description
            );
        }
        info!(
            "[QaFlow] {} pattern(s), {} agent(s) need coaching",
            report.insights.len(),
            report.coaching_candidates.len()
        );

        state.pattern_insights = report.insights;
        state.agents_needing_coaching = report.coaching_candidates;
        state.agent_averages = report.agent_averages;
        advance(state, FlowStage::PatternsDetected)
    }
}
