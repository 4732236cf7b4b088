//! Run Issues
//!
//! Per-interaction and per-agent problems that did not abort the run. They
//! are carried in the flow state and listed in every report.

use serde::{Deserialize, Serialize};

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Transcript skipped: missing field, duplicate id or unknown requirement set
    MalformedInput,
    /// Narrative analysis timed out on every attempt
    CollaboratorTimeout,
    /// Narrative analysis returned output that broke its contract
    CollaboratorInvalid,
    /// Narrative analysis failed for any other reason
    CollaboratorFailed,
    /// Coaching generation failed; a fallback plan was used
    CoachingFailed,
    /// The run was cancelled before completion
    Cancelled,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssueKind::MalformedInput => "malformed_input",
            IssueKind::CollaboratorTimeout => "collaborator_timeout",
            IssueKind::CollaboratorInvalid => "collaborator_invalid",
            IssueKind::CollaboratorFailed => "collaborator_failed",
            IssueKind::CoachingFailed => "coaching_failed",
            IssueKind::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

/// A recorded, non-fatal problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIssue {
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub message: String,
}

impl RunIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            interaction_id: None,
            agent_id: None,
            message: message.into(),
        }
    }

    pub fn for_interaction(mut self, interaction_id: impl Into<String>) -> Self {
        let id = interaction_id.into();
        if !id.trim().is_empty() {
            self.interaction_id = Some(id);
        }
        self
    }

    pub fn for_agent(mut self, agent_id: impl Into<String>) -> Self {
        let id = agent_id.into();
        if !id.trim().is_empty() {
            self.agent_id = Some(id);
        }
        self
    }
}

impl std::fmt::Display for RunIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(id) = &self.interaction_id {
            write!(f, " {}", id)?;
        }
        if let Some(agent) = &self.agent_id {
            write!(f, " (agent {})", agent)?;
        }
        write!(f, ": {}", self.message)
    }
}
