//! Risk Scoring Records
//!
//! Output of the red flag scanner. A `RiskScore` is created once per
//! transcript and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Triage tier deciding how deeply an interaction is analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Whether this tier receives full compliance + narrative analysis.
    pub fn needs_deep_analysis(&self) -> bool {
        matches!(self, Priority::Medium | Priority::High)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
        }
    }
}

/// Category of a red flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    Compliance,
    Complaint,
    Process,
}

impl std::fmt::Display for FlagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagCategory::Compliance => write!(f, "compliance"),
            FlagCategory::Complaint => write!(f, "complaint"),
            FlagCategory::Process => write!(f, "process"),
        }
    }
}

/// A single matched red flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// Flag category
    pub category: FlagCategory,
    /// Keyword group within the category (e.g. "churn_risk")
    pub group: String,
    /// Severity of the matched entry
    pub severity: Severity,
    /// The table term that matched (or an absence marker)
    pub matched_term: String,
    /// Bounded context around the first match
    pub snippet: String,
    /// Whether the matched term is designated critical
    #[serde(default)]
    pub critical: bool,
}

/// Risk assessment for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Interaction this score belongs to
    pub interaction_id: String,
    /// Review priority
    pub priority: Priority,
    /// Sum of matched severity weights
    pub score: f64,
    /// Matched flags in table order
    pub flags: Vec<RiskFlag>,
}

impl RiskScore {
    /// Whether any compliance-category flag was raised.
    pub fn has_compliance_flag(&self) -> bool {
        self.flags
            .iter()
            .any(|f| f.category == FlagCategory::Compliance)
    }

    /// Whether a designated critical term matched.
    pub fn has_critical_flag(&self) -> bool {
        self.flags.iter().any(|f| f.critical)
    }

    /// Distinct keyword groups that fired, in first-seen order.
    pub fn risk_factors(&self) -> Vec<&str> {
        let mut factors: Vec<&str> = Vec::new();
        for flag in &self.flags {
            if !factors.contains(&flag.group.as_str()) {
                factors.push(flag.group.as_str());
            }
        }
        factors
    }
}
