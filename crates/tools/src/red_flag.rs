//! Red Flag Scanner
//!
//! Case-insensitive keyword scan that turns a transcript into a `RiskScore`.
//! The scanner holds no state between calls: the same text and table always
//! produce the same flags, score and priority.

use serde::{Deserialize, Serialize};
use tracing::debug;

use qa_auditor_core::{
    channel_requires_disclosure, CoreError, CoreResult, FlagCategory, Priority, RiskFlag,
    RiskScore, Severity, Transcript,
};

use crate::text::{ScanText, SNIPPET_RADIUS};

/// Marker stored as `matched_term` when a required disclosure is absent.
pub const NO_DISCLOSURE_MARKER: &str = "(no recording disclosure found)";

// ============================================================================
// Keyword Table
// ============================================================================

/// A named group of terms sharing a category and severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    /// Group name (e.g. "churn_risk")
    pub name: String,
    /// Flag category raised by this group
    pub category: FlagCategory,
    /// Severity of every term in the group
    pub severity: Severity,
    /// Whether a match forces HIGH priority
    #[serde(default)]
    pub critical: bool,
    /// Terms matched case-insensitively
    pub terms: Vec<String>,
}

impl KeywordGroup {
    fn new(
        name: &str,
        category: FlagCategory,
        severity: Severity,
        critical: bool,
        terms: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            severity,
            critical,
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Phrases announcing that the interaction is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureRule {
    /// Group name used on the raised flag
    #[serde(default = "default_disclosure_group")]
    pub group: String,
    /// Severity of the raised flag
    #[serde(default = "default_disclosure_severity")]
    pub severity: Severity,
    /// Any one of these satisfies the rule
    pub phrases: Vec<String>,
}

fn default_disclosure_group() -> String {
    "missing_disclosure".to_string()
}

fn default_disclosure_severity() -> Severity {
    Severity::High
}

impl Default for DisclosureRule {
    fn default() -> Self {
        Self {
            group: default_disclosure_group(),
            severity: default_disclosure_severity(),
            phrases: [
                "call may be recorded",
                "call is being recorded",
                "this call is recorded",
                "for quality and training",
                "chat is being recorded",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

/// Risk weight contributed by one matched entry of each severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    #[serde(default = "default_critical_weight")]
    pub critical: f64,
    #[serde(default = "default_high_weight")]
    pub high: f64,
    #[serde(default = "default_medium_weight")]
    pub medium: f64,
    #[serde(default = "default_low_weight")]
    pub low: f64,
}

fn default_critical_weight() -> f64 {
    1.0
}
fn default_high_weight() -> f64 {
    0.7
}
fn default_medium_weight() -> f64 {
    0.4
}
fn default_low_weight() -> f64 {
    0.2
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: default_critical_weight(),
            high: default_high_weight(),
            medium: default_medium_weight(),
            low: default_low_weight(),
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Categorized keyword table driving the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    /// Groups in scan order
    pub groups: Vec<KeywordGroup>,
    /// Required recording disclosure
    #[serde(default)]
    pub disclosure: DisclosureRule,
    /// Severity weights
    #[serde(default)]
    pub weights: SeverityWeights,
}

impl Default for KeywordTable {
    fn default() -> Self {
        use FlagCategory::*;

        let groups = vec![
            KeywordGroup::new(
                "card_number_exposure",
                Compliance,
                Severity::Critical,
                true,
                &[
                    "card number is",
                    "your card number",
                    "read back your card",
                    "full card number",
                ],
            ),
            KeywordGroup::new(
                "payment_card_mention",
                Compliance,
                Severity::High,
                false,
                &["credit card", "card ending in"],
            ),
            KeywordGroup::new(
                "ssn_exposure",
                Compliance,
                Severity::Critical,
                true,
                &["your social security number is", "your ssn is"],
            ),
            KeywordGroup::new(
                "data_handling",
                Compliance,
                Severity::High,
                false,
                &["social security number", "date of birth", "mother's maiden"],
            ),
            KeywordGroup::new(
                "escalation_request",
                Complaint,
                Severity::High,
                false,
                &[
                    "speak to a manager",
                    "speak to a supervisor",
                    "transfer me to",
                    "your manager",
                    "escalate",
                    "file a complaint",
                    "formal complaint",
                ],
            ),
            KeywordGroup::new(
                "churn_risk",
                Complaint,
                Severity::High,
                false,
                &[
                    "cancel my",
                    "cancellation",
                    "switch to",
                    "competitor",
                    "done with you",
                    "never coming back",
                ],
            ),
            KeywordGroup::new(
                "frustration",
                Complaint,
                Severity::High,
                false,
                &[
                    "unacceptable",
                    "ridiculous",
                    "worst service",
                    "been waiting",
                    "already told",
                    "keep repeating",
                    "waste of time",
                ],
            ),
            KeywordGroup::new(
                "hold_issues",
                Process,
                Severity::Medium,
                false,
                &["been on hold", "long hold", "holding for", "waited for"],
            ),
            KeywordGroup::new(
                "transfer_issues",
                Process,
                Severity::Medium,
                false,
                &[
                    "transferred again",
                    "third person",
                    "keep getting transferred",
                    "bounced around",
                ],
            ),
            KeywordGroup::new(
                "repeat_contact",
                Process,
                Severity::Medium,
                false,
                &[
                    "called before",
                    "called yesterday",
                    "already contacted",
                    "third time calling",
                    "same issue",
                ],
            ),
        ];

        Self {
            groups,
            disclosure: DisclosureRule::default(),
            weights: SeverityWeights::default(),
        }
    }
}

impl KeywordTable {
    /// Check the table for empty groups, empty terms and negative weights.
    pub fn validate(&self) -> CoreResult<()> {
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(CoreError::config("keyword group with empty name"));
            }
            if group.terms.is_empty() {
                return Err(CoreError::config(format!(
                    "keyword group '{}' has no terms",
                    group.name
                )));
            }
            if group.terms.iter().any(|t| t.trim().is_empty()) {
                return Err(CoreError::config(format!(
                    "keyword group '{}' contains an empty term",
                    group.name
                )));
            }
        }
        if self.disclosure.phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::config("disclosure rule contains an empty phrase"));
        }
        let w = &self.weights;
        for (name, value) in [
            ("critical", w.critical),
            ("high", w.high),
            ("medium", w.medium),
            ("low", w.low),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::config(format!(
                    "severity weight '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Score thresholds for the MEDIUM and HIGH tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Score at or above which priority is at least MEDIUM
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
    /// Score at or above which priority is HIGH
    #[serde(default = "default_high_threshold")]
    pub high: f64,
}

fn default_medium_threshold() -> f64 {
    0.7
}

fn default_high_threshold() -> f64 {
    1.8
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium_threshold(),
            high: default_high_threshold(),
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.medium.is_finite() && self.high.is_finite()) || self.medium < 0.0 {
            return Err(CoreError::config("risk thresholds must be non-negative numbers"));
        }
        if self.medium > self.high {
            return Err(CoreError::config(format!(
                "medium risk threshold {} exceeds high threshold {}",
                self.medium, self.high
            )));
        }
        Ok(())
    }

    /// Priority for a score and the flag-derived floors.
    pub fn priority_for(&self, score: f64, has_compliance: bool, has_critical: bool) -> Priority {
        if has_critical || score >= self.high {
            Priority::High
        } else if has_compliance || score >= self.medium {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Keyword scanner over a fixed table.
#[derive(Debug, Clone, Default)]
pub struct RedFlagScanner {
    table: KeywordTable,
    thresholds: RiskThresholds,
}

impl RedFlagScanner {
    pub fn new(table: KeywordTable, thresholds: RiskThresholds) -> Self {
        Self { table, thresholds }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Scan a transcript, applying the disclosure rule for its channel.
    pub fn scan(&self, transcript: &Transcript) -> RiskScore {
        self.scan_text(
            &transcript.interaction_id,
            &transcript.transcript_text,
            &transcript.channel,
        )
    }

    /// Scan raw text for one interaction.
    pub fn scan_text(&self, interaction_id: &str, text: &str, channel: &str) -> RiskScore {
        let scan = ScanText::new(text);
        let mut flags = Vec::new();

        for group in &self.table.groups {
            // A term whose match overlaps an earlier term's match in the same
            // group is the same mention and is not flagged again.
            let mut claimed: Vec<(usize, usize)> = Vec::new();
            for term in &group.terms {
                let Some((start, end)) = scan.span(term) else {
                    continue;
                };
                if claimed.iter().any(|&(s, e)| start < e && s < end) {
                    continue;
                }
                claimed.push((start, end));
                flags.push(RiskFlag {
                    category: group.category,
                    group: group.name.clone(),
                    severity: group.severity,
                    matched_term: term.clone(),
                    snippet: scan.snippet(start, end, SNIPPET_RADIUS),
                    critical: group.critical,
                });
            }
        }

        let disclosure = &self.table.disclosure;
        if channel_requires_disclosure(channel)
            && !disclosure.phrases.is_empty()
            && !disclosure.phrases.iter().any(|p| scan.contains(p))
        {
            flags.push(RiskFlag {
                category: FlagCategory::Compliance,
                group: disclosure.group.clone(),
                severity: disclosure.severity,
                matched_term: NO_DISCLOSURE_MARKER.to_string(),
                snippet: String::new(),
                critical: false,
            });
        }

        let raw: f64 = flags
            .iter()
            .map(|f| self.table.weights.weight(f.severity))
            .sum();
        let score = (raw * 100.0).round() / 100.0;

        let has_compliance = flags.iter().any(|f| f.category == FlagCategory::Compliance);
        let has_critical = flags.iter().any(|f| f.critical);
        let priority = self
            .thresholds
            .priority_for(score, has_compliance, has_critical);

        debug!(
            "[RedFlagScanner] {}: {} flag(s), score {:.2}, priority {}",
            interaction_id,
            flags.len(),
            score,
            priority
        );

        RiskScore {
            interaction_id: interaction_id.to_string(),
            priority,
            score,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCLOSED: &str = "Thank you for calling, this call may be recorded for quality and training.";

    fn scanner() -> RedFlagScanner {
        RedFlagScanner::default()
    }

    #[test]
    fn test_clean_voice_call_is_low() {
        let text = format!("{} How can I help you today? Thanks, that fixed it.", DISCLOSED);
        let score = scanner().scan_text("INT-1", &text, "voice");
        assert!(score.flags.is_empty());
        assert_eq!(score.score, 0.0);
        assert_eq!(score.priority, Priority::Low);
    }

    #[test]
    fn test_card_readback_is_high() {
        let text = format!("{} Let me confirm, your card number is 4111 1111 1111 1111.", DISCLOSED);
        let score = scanner().scan_text("INT-2", &text, "voice");
        assert_eq!(score.priority, Priority::High);
        assert!(score.has_critical_flag());
        assert!(score
            .flags
            .iter()
            .any(|f| f.group == "card_number_exposure" && f.snippet.contains("4111")));
    }

    #[test]
    fn test_single_readback_flags_once() {
        let text = format!("{} Okay, your card number is 4111 1111 1111 1111.", DISCLOSED);
        let score = scanner().scan_text("INT-2", &text, "voice");
        let exposure: Vec<_> = score
            .flags
            .iter()
            .filter(|f| f.group == "card_number_exposure")
            .collect();
        assert_eq!(exposure.len(), 1);
        assert_eq!(exposure[0].matched_term, "card number is");
        assert_eq!(score.flags.len(), 1);
        assert_eq!(score.score, 1.0);
    }

    #[test]
    fn test_separate_mentions_in_group_both_count() {
        let text = format!(
            "{} I asked for a supervisor and then said I would file a complaint.",
            DISCLOSED
        );
        let mut table = KeywordTable::default();
        table.groups.retain(|g| g.name == "escalation_request");
        table.groups[0].terms = vec!["supervisor".to_string(), "file a complaint".to_string()];
        let score = RedFlagScanner::new(table, RiskThresholds::default())
            .scan_text("INT-7", &text, "voice");
        assert_eq!(score.flags.len(), 2);
    }

    #[test]
    fn test_missing_disclosure_forces_medium_on_voice_only() {
        let text = "Hello, how can I help?";
        let voice = scanner().scan_text("INT-3", text, "voice");
        assert_eq!(voice.priority, Priority::Medium);
        assert_eq!(voice.flags.len(), 1);
        assert_eq!(voice.flags[0].matched_term, NO_DISCLOSURE_MARKER);

        let email = scanner().scan_text("INT-4", text, "email");
        assert!(email.flags.is_empty());
        assert_eq!(email.priority, Priority::Low);
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let once = format!("{} This is unacceptable.", DISCLOSED);
        let many = format!("{} Unacceptable. UNACCEPTABLE. unacceptable!", DISCLOSED);
        let a = scanner().scan_text("A", &once, "chat");
        let b = scanner().scan_text("B", &many, "chat");
        assert_eq!(a.score, b.score);
        assert_eq!(a.flags.len(), b.flags.len());
    }

    #[test]
    fn test_scan_is_pure() {
        let text = "I want to speak to a manager, I have been on hold forever. Cancel my account.";
        let first = scanner().scan_text("INT-5", text, "voice");
        let second = scanner().scan_text("INT-5", text, "voice");
        assert_eq!(first, second);
    }

    #[test]
    fn test_complaints_accumulate_to_high() {
        let text = format!(
            "{} This is unacceptable, I want to speak to a manager or I will cancel my plan.",
            DISCLOSED
        );
        let score = scanner().scan_text("INT-6", &text, "voice");
        assert_eq!(score.score, 2.1);
        assert_eq!(score.priority, Priority::High);
        assert_eq!(
            score.risk_factors(),
            vec!["escalation_request", "churn_risk", "frustration"]
        );
    }

    #[test]
    fn test_priority_is_monotonic_in_score() {
        let thresholds = RiskThresholds::default();
        let mut previous = Priority::Low;
        for step in 0..40 {
            let score = step as f64 * 0.1;
            let priority = thresholds.priority_for(score, false, false);
            assert!(priority >= previous);
            previous = priority;
        }
        assert_eq!(previous, Priority::High);
    }

    #[test]
    fn test_table_validation() {
        assert!(KeywordTable::default().validate().is_ok());

        let mut table = KeywordTable::default();
        table.groups[0].terms.push("  ".to_string());
        assert!(table.validate().is_err());

        let mut table = KeywordTable::default();
        table.weights.high = -1.0;
        assert!(table.validate().is_err());

        let thresholds = RiskThresholds {
            medium: 2.0,
            high: 1.0,
        };
        assert!(thresholds.validate().is_err());
    }
}
