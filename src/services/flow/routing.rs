//! Compliance routing.

use std::collections::BTreeMap;

use tracing::info;

use qa_auditor_core::QaEvaluation;

use super::{advance, QaAuditorFlow};
use crate::models::{FlowStage, FlowState};
use crate::utils::error::AppResult;

/// True iff some evaluation carries a CRITICAL violated finding.
pub fn route_by_compliance(evaluations: &BTreeMap<String, QaEvaluation>) -> bool {
    evaluations.values().any(|e| e.has_critical_violation())
}

impl QaAuditorFlow {
    pub(super) fn route(&self, state: &mut FlowState) -> AppResult<()> {
        state.has_critical_violations = route_by_compliance(&state.evaluations);
        info!(
            "[QaFlow] Routing: critical violations {}",
            if state.has_critical_violations {
                "present, escalating"
            } else {
                "absent"
            }
        );
        advance(state, FlowStage::Routed)
    }
}
