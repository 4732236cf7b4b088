//! Pattern Aggregator
//!
//! Counts recurring issues across completed evaluations and classifies each
//! one as agent-specific or systemic. A key seen for enough distinct agents
//! is reported once as systemic and never again per agent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use qa_auditor_core::{
    CoreError, CoreResult, PatternInsight, PatternKey, PatternScope, QaEvaluation, Severity,
};

use crate::scorecard::round_one_decimal;

/// Thresholds controlling classification and coaching eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternThresholds {
    /// Sub-scores strictly below this count as a low-score occurrence
    #[serde(default = "default_low_score")]
    pub low_score: f64,
    /// Occurrences one agent needs for an agent-specific pattern
    #[serde(default = "default_agent_min_occurrences")]
    pub agent_min_occurrences: usize,
    /// Distinct agents needed for a systemic pattern
    #[serde(default = "default_systemic_min_agents")]
    pub systemic_min_agents: usize,
    /// Agents averaging strictly below this need coaching
    #[serde(default = "default_coaching_threshold")]
    pub coaching_threshold: f64,
}

fn default_low_score() -> f64 {
    70.0
}

fn default_agent_min_occurrences() -> usize {
    2
}

fn default_systemic_min_agents() -> usize {
    2
}

fn default_coaching_threshold() -> f64 {
    70.0
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            low_score: default_low_score(),
            agent_min_occurrences: default_agent_min_occurrences(),
            systemic_min_agents: default_systemic_min_agents(),
            coaching_threshold: default_coaching_threshold(),
        }
    }
}

impl PatternThresholds {
    pub fn validate(&self) -> CoreResult<()> {
        if self.agent_min_occurrences == 0 {
            return Err(CoreError::config("agent_min_occurrences must be at least 1"));
        }
        if self.systemic_min_agents < 2 {
            return Err(CoreError::config("systemic_min_agents must be at least 2"));
        }
        for (name, value) in [
            ("low_score", self.low_score),
            ("coaching_threshold", self.coaching_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CoreError::config(format!(
                    "{} must be within [0, 100], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    /// Systemic insights first, then by severity (highest first)
    pub insights: Vec<PatternInsight>,
    /// Agents that should receive a coaching plan
    pub coaching_candidates: BTreeSet<String>,
    /// Mean overall score per agent over fully analyzed evaluations
    pub agent_averages: BTreeMap<String, f64>,
}

/// Occurrences of one key for one agent.
#[derive(Debug, Default)]
struct Occurrences {
    interactions: BTreeSet<String>,
    severity: Option<Severity>,
    lowest_score: Option<f64>,
}

impl Occurrences {
    fn record(&mut self, interaction_id: &str, severity: Option<Severity>, score: Option<f64>) {
        self.interactions.insert(interaction_id.to_string());
        if let Some(s) = severity {
            self.severity = Some(self.severity.map_or(s, |cur| cur.max(s)));
        }
        if let Some(v) = score {
            self.lowest_score = Some(self.lowest_score.map_or(v, |cur| cur.min(v)));
        }
    }
}

/// Cross-agent pattern detection over a batch of evaluations.
#[derive(Debug, Clone, Default)]
pub struct PatternAggregator {
    thresholds: PatternThresholds,
}

impl PatternAggregator {
    pub fn new(thresholds: PatternThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PatternThresholds {
        &self.thresholds
    }

    /// Detect patterns and select coaching candidates.
    ///
    /// Violations count from every evaluation. Low-score occurrences and
    /// averages only use evaluations that were fully analyzed or default
    /// passed, so defaulted scores never look like agent behavior.
    pub fn aggregate<'a, I>(&self, evaluations: I) -> PatternReport
    where
        I: IntoIterator<Item = &'a QaEvaluation>,
    {
        let mut counts: BTreeMap<PatternKey, BTreeMap<String, Occurrences>> = BTreeMap::new();
        let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();

        for eval in evaluations {
            for finding in eval.violations() {
                let key = PatternKey::Violation {
                    requirement_id: finding.requirement_id.clone(),
                };
                counts
                    .entry(key)
                    .or_default()
                    .entry(eval.agent_id.clone())
                    .or_default()
                    .record(&eval.interaction_id, Some(finding.severity), None);
            }

            if eval.is_degraded() {
                continue;
            }

            for (dimension, score) in eval.scores.iter() {
                if score < self.thresholds.low_score {
                    counts
                        .entry(PatternKey::LowScore { dimension })
                        .or_default()
                        .entry(eval.agent_id.clone())
                        .or_default()
                        .record(&eval.interaction_id, None, Some(score));
                }
            }

            let entry = totals.entry(eval.agent_id.clone()).or_insert((0.0, 0));
            entry.0 += eval.overall;
            entry.1 += 1;
        }

        let mut insights = Vec::new();
        for (key, per_agent) in &counts {
            if per_agent.len() >= self.thresholds.systemic_min_agents {
                insights.push(self.systemic_insight(key, per_agent));
            } else {
                for (agent_id, occ) in per_agent {
                    if occ.interactions.len() >= self.thresholds.agent_min_occurrences {
                        insights.push(self.agent_insight(key, agent_id, occ));
                    }
                }
            }
        }

        insights.sort_by(|a, b| {
            a.scope
                .cmp(&b.scope)
                .then(b.severity.cmp(&a.severity))
                .then(a.key.cmp(&b.key))
                .then(a.agent_id.cmp(&b.agent_id))
        });

        let agent_averages: BTreeMap<String, f64> = totals
            .into_iter()
            .map(|(agent, (sum, n))| (agent, round_one_decimal(sum / n as f64)))
            .collect();

        let mut coaching_candidates: BTreeSet<String> = insights
            .iter()
            .flat_map(|i| i.affected_agents.iter().cloned())
            .collect();
        for (agent, average) in &agent_averages {
            if *average < self.thresholds.coaching_threshold {
                coaching_candidates.insert(agent.clone());
            }
        }

        PatternReport {
            insights,
            coaching_candidates,
            agent_averages,
        }
    }

    fn severity_for(&self, key: &PatternKey, occurrences: &[&Occurrences]) -> Severity {
        match key {
            PatternKey::Violation { .. } => occurrences
                .iter()
                .filter_map(|o| o.severity)
                .max()
                .unwrap_or(Severity::Medium),
            PatternKey::LowScore { .. } => {
                let lowest = occurrences
                    .iter()
                    .filter_map(|o| o.lowest_score)
                    .fold(f64::INFINITY, f64::min);
                if lowest < 50.0 {
                    Severity::High
                } else {
                    Severity::Medium
                }
            }
        }
    }

    fn systemic_insight(
        &self,
        key: &PatternKey,
        per_agent: &BTreeMap<String, Occurrences>,
    ) -> PatternInsight {
        let affected_agents: BTreeSet<String> = per_agent.keys().cloned().collect();
        let affected_interactions: BTreeSet<String> = per_agent
            .values()
            .flat_map(|o| o.interactions.iter().cloned())
            .collect();
        let occurrences: Vec<&Occurrences> = per_agent.values().collect();

        let description = match key {
            PatternKey::Violation { requirement_id } => format!(
                "Requirement '{}' violated by {} agents across {} interactions",
                requirement_id,
                affected_agents.len(),
                affected_interactions.len()
            ),
            PatternKey::LowScore { dimension } => format!(
                "{} scored below {} for {} agents across {} interactions",
                dimension.display_name(),
                self.thresholds.low_score,
                affected_agents.len(),
                affected_interactions.len()
            ),
        };

        PatternInsight {
            scope: PatternScope::Systemic,
            agent_id: None,
            key: key.clone(),
            description,
            severity: self.severity_for(key, &occurrences),
            affected_agents,
            affected_interactions,
        }
    }

    fn agent_insight(&self, key: &PatternKey, agent_id: &str, occ: &Occurrences) -> PatternInsight {
        let description = match key {
            PatternKey::Violation { requirement_id } => format!(
                "Agent {} violated requirement '{}' in {} interactions",
                agent_id,
                requirement_id,
                occ.interactions.len()
            ),
            PatternKey::LowScore { dimension } => format!(
                "Agent {} scored below {} on {} in {} interactions",
                agent_id,
                self.thresholds.low_score,
                dimension.display_name(),
                occ.interactions.len()
            ),
        };

        PatternInsight {
            scope: PatternScope::AgentSpecific,
            agent_id: Some(agent_id.to_string()),
            key: key.clone(),
            description,
            severity: self.severity_for(key, &[occ]),
            affected_agents: std::iter::once(agent_id.to_string()).collect(),
            affected_interactions: occ.interactions.clone(),
        }
    }
}
