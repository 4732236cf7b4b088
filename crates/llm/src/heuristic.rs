//! Heuristic Provider
//!
//! Rule-based stand-in for the narrative collaborators. Scores come from
//! compliance findings, resolution status and a handful of phrase cues, so
//! runs are reproducible and need no network access.

use async_trait::async_trait;

use qa_auditor_core::{Dimension, Severity, SubScores};

use super::provider::NarrativeProvider;
use super::types::{
    AnalysisRequest, CoachingDraft, CoachingRequest, LlmResult, NarrativeAnalysis,
};

const EMPATHY_CUES: &[&str] = &[
    "i understand",
    "i'm sorry",
    "i am sorry",
    "i apologize",
    "thank you for your patience",
    "i appreciate",
    "that must be frustrating",
];

const DISMISSIVE_CUES: &[&str] = &[
    "calm down",
    "not my problem",
    "nothing i can do",
    "as i already said",
    "you should have",
];

const PROCESS_CUES: &[&str] = &[
    "put you on hold",
    "on hold",
    "transfer you",
    "let me check with",
    "call you back",
    "system is down",
];

const CLOSING_CUES: &[&str] = &[
    "anything else i can help",
    "is there anything else",
    "have a great day",
];

/// Deterministic narrative backend.
#[derive(Debug, Clone, Default)]
pub struct HeuristicProvider;

impl HeuristicProvider {
    pub fn new() -> Self {
        Self
    }

    fn score(request: &AnalysisRequest) -> SubScores {
        let text = request.transcript_text.to_ascii_lowercase();
        let count = |cues: &[&str]| cues.iter().filter(|c| text.contains(*c)).count() as f64;

        let penalty: f64 = request
            .findings
            .iter()
            .filter(|f| f.is_violation())
            .map(|f| match f.severity {
                Severity::Critical => 40.0,
                Severity::High => 25.0,
                Severity::Medium => 15.0,
                Severity::Low => 5.0,
            })
            .sum();
        let compliance = 100.0 - penalty;

        let empathy = 60.0 + 8.0 * count(EMPATHY_CUES) - 15.0 * count(DISMISSIVE_CUES);

        let resolution = match request
            .resolution_status
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "resolved" => 90.0,
            "partially_resolved" | "partial" => 70.0,
            "escalated" => 60.0,
            "pending" => 55.0,
            "unresolved" => 40.0,
            _ => 65.0,
        } + if count(CLOSING_CUES) > 0.0 { 5.0 } else { 0.0 };

        let process = 85.0 - 10.0 * count(PROCESS_CUES) + 5.0 * count(CLOSING_CUES).min(1.0);

        let clamp = |v: f64| v.clamp(0.0, 100.0);
        SubScores::new(clamp(compliance), clamp(empathy), clamp(resolution), clamp(process))
    }
}

#[async_trait]
impl NarrativeProvider for HeuristicProvider {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze_interaction(
        &self,
        request: &AnalysisRequest,
    ) -> LlmResult<NarrativeAnalysis> {
        let scores = Self::score(request);
        let violations: Vec<&str> = request
            .findings
            .iter()
            .filter(|f| f.is_violation())
            .map(|f| f.requirement_id.as_str())
            .collect();

        let strengths: Vec<String> = scores
            .iter()
            .filter(|(_, s)| *s >= 80.0)
            .map(|(d, _)| format!("Strong {}", d.display_name().to_lowercase()))
            .collect();

        let mut improvement_areas: Vec<String> = scores
            .iter()
            .filter(|(_, s)| *s < 70.0)
            .map(|(d, _)| format!("Improve {}", d.display_name().to_lowercase()))
            .collect();
        improvement_areas.extend(violations.iter().map(|id| format!("Address {}", id)));

        let commentary = if violations.is_empty() {
            format!(
                "No compliance violations against '{}'. Weakest dimension: {}.",
                request.requirement_set,
                scores.weakest().display_name()
            )
        } else {
            format!(
                "{} violation(s) against '{}': {}. Weakest dimension: {}.",
                violations.len(),
                request.requirement_set,
                violations.join(", "),
                scores.weakest().display_name()
            )
        };

        let analysis = NarrativeAnalysis {
            compliance: scores.compliance,
            empathy: scores.empathy,
            resolution: scores.resolution,
            process: scores.process,
            commentary,
            strengths,
            improvement_areas,
        };
        analysis.validate()?;
        Ok(analysis)
    }

    async fn draft_coaching_plan(&self, request: &CoachingRequest) -> LlmResult<CoachingDraft> {
        let draft = rule_based_draft(request);
        draft.validate()?;
        Ok(draft)
    }
}

/// Coaching draft built from the weakest dimensions and violated
/// requirements of the curated examples. Never empty.
pub fn rule_based_draft(request: &CoachingRequest) -> CoachingDraft {
    let mut focus_areas: Vec<String> = request
        .weakest_dimensions
        .iter()
        .take(2)
        .map(|d| d.display_name().to_string())
        .collect();

    let mut violated: Vec<&str> = Vec::new();
    for example in &request.examples {
        for id in &example.violated_requirements {
            if !violated.contains(&id.as_str()) {
                violated.push(id.as_str());
            }
        }
    }
    focus_areas.extend(violated.iter().map(|id| format!("Compliance: {}", id)));
    if focus_areas.is_empty() {
        focus_areas.push("Overall call quality".to_string());
    }

    let mut action_items: Vec<String> = request
        .weakest_dimensions
        .iter()
        .take(2)
        .map(|d| action_for(*d).to_string())
        .collect();
    action_items.extend(
        violated
            .iter()
            .map(|id| format!("Review the '{}' requirement with a supervisor", id)),
    );
    if let Some(worst) = request.examples.first() {
        action_items.push(format!(
            "Walk through interaction {} in the next one-on-one",
            worst.interaction_id
        ));
    }
    if action_items.is_empty() {
        action_items.push("Schedule a calibration session with the QA lead".to_string());
    }

    let summary = Some(format!(
        "{} averages {:.1} across audited interactions; focus first on {}.",
        request.agent_name, request.average_overall, focus_areas[0]
    ));

    CoachingDraft {
        focus_areas,
        action_items,
        summary,
    }
}

/// Standard action item for a weak dimension.
pub fn action_for(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Compliance => "Complete the mandatory disclosure and verification refresher",
        Dimension::Empathy => "Practice acknowledgement statements in weekly role-play",
        Dimension::Resolution => "Use the resolution checklist before closing each interaction",
        Dimension::Process => "Follow the hold and transfer procedure; shadow a senior agent",
    }
}
