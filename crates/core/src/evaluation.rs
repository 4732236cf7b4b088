//! Evaluation Records
//!
//! Compliance findings, the four scoring dimensions and the per-interaction
//! QA evaluation that combines them.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

// ============================================================================
// Dimensions and Sub-scores
// ============================================================================

/// A scoring dimension of the QA scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Compliance,
    Empathy,
    Resolution,
    Process,
}

impl Dimension {
    /// All dimensions in scorecard order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Compliance,
        Dimension::Empathy,
        Dimension::Resolution,
        Dimension::Process,
    ];

    /// Stable identifier used in tables and pattern keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Compliance => "compliance",
            Dimension::Empathy => "empathy",
            Dimension::Resolution => "resolution",
            Dimension::Process => "process",
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Dimension::Compliance => "Compliance",
            Dimension::Empathy => "Empathy",
            Dimension::Resolution => "Resolution",
            Dimension::Process => "Process Adherence",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four raw sub-dimension scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub compliance: f64,
    pub empathy: f64,
    pub resolution: f64,
    pub process: f64,
}

impl SubScores {
    /// Create a set of sub-scores.
    pub fn new(compliance: f64, empathy: f64, resolution: f64, process: f64) -> Self {
        Self {
            compliance,
            empathy,
            resolution,
            process,
        }
    }

    /// All four dimensions set to the same value.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Score for one dimension.
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Compliance => self.compliance,
            Dimension::Empathy => self.empathy,
            Dimension::Resolution => self.resolution,
            Dimension::Process => self.process,
        }
    }

    /// (dimension, score) pairs in scorecard order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    /// The dimension with the lowest score (first in scorecard order on ties).
    pub fn weakest(&self) -> Dimension {
        let mut weakest = Dimension::Compliance;
        for (dimension, score) in self.iter() {
            if score < self.get(weakest) {
                weakest = dimension;
            }
        }
        weakest
    }
}

// ============================================================================
// Compliance Findings
// ============================================================================

/// Outcome of one compliance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Satisfied,
    Violated,
}

/// Evidence attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// Context around the phrase that matched
    Snippet(String),
    /// None of the rule's phrases appear in the text
    Absent,
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evidence::Snippet(text) => write!(f, "\"{}\"", text),
            Evidence::Absent => write!(f, "(not present)"),
        }
    }
}

/// Result of checking one compliance rule against a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFinding {
    /// Rule identifier (e.g. "call_recording_disclosure")
    pub requirement_id: String,
    /// Severity configured on the rule
    pub severity: Severity,
    /// Satisfied or violated
    pub status: FindingStatus,
    /// Matched snippet or absence marker
    pub evidence: Evidence,
}

impl ComplianceFinding {
    /// Whether this finding is a violation.
    pub fn is_violation(&self) -> bool {
        self.status == FindingStatus::Violated
    }

    /// Whether this finding is a CRITICAL violation.
    pub fn is_critical_violation(&self) -> bool {
        self.is_violation() && self.severity == Severity::Critical
    }
}

// ============================================================================
// QA Evaluation
// ============================================================================

/// How an evaluation was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// Compliance matching plus narrative analysis
    Full,
    /// Synthetic pass for LOW-risk interactions
    DefaultPass,
    /// Narrative analysis unavailable; sub-scores defaulted
    Degraded,
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Full => write!(f, "full"),
            EvaluationStatus::DefaultPass => write!(f, "default_pass"),
            EvaluationStatus::Degraded => write!(f, "degraded (analysis incomplete)"),
        }
    }
}

/// Performance band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    Critical,
    NeedsImprovement,
    MeetsExpectations,
    ExceedsExpectations,
}

impl PerformanceBand {
    /// Band for an overall score: >=90 exceeds, >=75 meets, >=60 needs improvement.
    pub fn from_score(overall: f64) -> Self {
        if overall >= 90.0 {
            PerformanceBand::ExceedsExpectations
        } else if overall >= 75.0 {
            PerformanceBand::MeetsExpectations
        } else if overall >= 60.0 {
            PerformanceBand::NeedsImprovement
        } else {
            PerformanceBand::Critical
        }
    }

    /// Label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceBand::Critical => "critical",
            PerformanceBand::NeedsImprovement => "needs_improvement",
            PerformanceBand::MeetsExpectations => "meets_expectations",
            PerformanceBand::ExceedsExpectations => "exceeds_expectations",
        }
    }
}

/// QA evaluation for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEvaluation {
    /// Interaction identifier
    pub interaction_id: String,
    /// Agent who handled the interaction
    pub agent_id: String,
    /// Raw sub-dimension scores
    #[serde(flatten)]
    pub scores: SubScores,
    /// Weighted overall score (one decimal)
    pub overall: f64,
    /// Weight profile used for `overall`
    pub weight_profile: String,
    /// Band for `overall`
    pub band: PerformanceBand,
    /// Requirement set the findings were checked against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_set: Option<String>,
    /// Compliance findings in rule order
    pub findings: Vec<ComplianceFinding>,
    /// How this evaluation was produced
    pub status: EvaluationStatus,
    /// Free-text commentary from narrative analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    /// Observed strengths
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Suggested improvement areas
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

impl QaEvaluation {
    /// Violated findings, in rule order.
    pub fn violations(&self) -> impl Iterator<Item = &ComplianceFinding> {
        self.findings.iter().filter(|f| f.is_violation())
    }

    /// CRITICAL violated findings, in rule order.
    pub fn critical_violations(&self) -> impl Iterator<Item = &ComplianceFinding> {
        self.findings.iter().filter(|f| f.is_critical_violation())
    }

    /// Whether any finding is a CRITICAL violation.
    pub fn has_critical_violation(&self) -> bool {
        self.findings.iter().any(|f| f.is_critical_violation())
    }

    /// Whether narrative analysis failed for this interaction.
    pub fn is_degraded(&self) -> bool {
        self.status == EvaluationStatus::Degraded
    }
}
