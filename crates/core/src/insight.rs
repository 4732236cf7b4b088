//! Pattern Insights and Coaching Plans

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::evaluation::{Dimension, PerformanceBand};
use crate::severity::Severity;

/// Whether a recurring issue belongs to one agent or spans several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternScope {
    Systemic,
    AgentSpecific,
}

impl std::fmt::Display for PatternScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternScope::Systemic => write!(f, "systemic"),
            PatternScope::AgentSpecific => write!(f, "agent_specific"),
        }
    }
}

/// The kind of issue a pattern is counted on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternKey {
    /// A compliance rule that was violated
    Violation { requirement_id: String },
    /// A dimension scored below the low-score threshold
    LowScore { dimension: Dimension },
}

impl std::fmt::Display for PatternKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternKey::Violation { requirement_id } => write!(f, "violation:{}", requirement_id),
            PatternKey::LowScore { dimension } => write!(f, "low_score:{}", dimension),
        }
    }
}

/// A recurring issue detected across evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternInsight {
    /// Systemic or agent-specific
    pub scope: PatternScope,
    /// Agent the pattern belongs to (agent-specific only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// What recurs
    pub key: PatternKey,
    /// Human-readable description
    pub description: String,
    /// Every agent exhibiting the pattern
    pub affected_agents: BTreeSet<String>,
    /// Every interaction exhibiting the pattern
    pub affected_interactions: BTreeSet<String>,
    /// Pattern severity
    pub severity: Severity,
}

/// Where a coaching plan's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Produced by the narrative generation collaborator
    Generated,
    /// Built locally after the collaborator failed
    Fallback,
}

/// A reference into a concrete interaction used as a coaching example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingExample {
    /// Interaction the example comes from
    pub interaction_id: String,
    /// Overall score of that interaction
    pub overall: f64,
    /// Weakest dimension of that interaction
    pub weakest_dimension: Dimension,
    /// Violated requirement ids of that interaction
    pub violated_requirements: Vec<String>,
    /// Improvement areas noted during evaluation
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

/// Per-agent coaching plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingPlan {
    /// Agent identifier
    pub agent_id: String,
    /// Agent display name
    pub agent_name: String,
    /// Average overall score across the agent's evaluations
    pub average_overall: f64,
    /// Band of the average overall score
    pub band: PerformanceBand,
    /// Ordered coaching topics
    pub focus_areas: Vec<String>,
    /// Concrete interactions backing the plan
    pub examples: Vec<CoachingExample>,
    /// Action items for the agent and their supervisor
    pub action_items: Vec<String>,
    /// Narrative summary, when the collaborator produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Generated or fallback
    pub source: PlanSource,
}
