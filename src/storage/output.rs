//! Run Output Persistence
//!
//! Writes the final state and the rendered reports into an output
//! directory. The escalation report is only written when the run escalated.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::FlowState;
use crate::utils::error::AppResult;

pub const FULL_STATE_FILE: &str = "full_state.json";
pub const EXECUTIVE_SUMMARY_FILE: &str = "executive_summary.txt";
pub const DETAILED_REPORT_FILE: &str = "detailed_report.txt";
pub const ESCALATION_FILE: &str = "compliance_escalation.txt";

/// Write every output of `state` into `dir`, returning the written paths.
pub fn write_outputs(state: &FlowState, dir: &Path) -> AppResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let state_path = dir.join(FULL_STATE_FILE);
    fs::write(&state_path, serde_json::to_string_pretty(state)?)?;
    written.push(state_path);

    let summary_path = dir.join(EXECUTIVE_SUMMARY_FILE);
    fs::write(&summary_path, &state.executive_summary)?;
    written.push(summary_path);

    let detail_path = dir.join(DETAILED_REPORT_FILE);
    fs::write(&detail_path, &state.detailed_report)?;
    written.push(detail_path);

    if state.has_critical_violations {
        if let Some(report) = &state.escalation_report {
            let escalation_path = dir.join(ESCALATION_FILE);
            fs::write(&escalation_path, report.render())?;
            written.push(escalation_path);
        }
    }

    info!(
        "[Output] Wrote {} file(s) to {}",
        written.len(),
        dir.display()
    );
    Ok(written)
}
