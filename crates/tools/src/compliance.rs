//! Compliance Pattern Matcher
//!
//! Checks transcript text against a named requirement set. Each rule is
//! either a required phrase list (one must appear) or a forbidden phrase list
//! (none may appear). Every rule yields exactly one finding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qa_auditor_core::{
    ComplianceFinding, CoreError, CoreResult, Evidence, FindingStatus, Severity,
};

use crate::text::ScanText;

// ============================================================================
// Requirement Sets
// ============================================================================

/// Whether a rule's phrases are required or forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MustContain,
    MustNotContain,
}

/// A single compliance requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRule {
    /// Requirement identifier
    pub id: String,
    pub kind: RuleKind,
    /// Severity of a violation
    pub severity: Severity,
    /// Phrases matched case-insensitively
    pub phrases: Vec<String>,
}

impl ComplianceRule {
    fn new(id: &str, kind: RuleKind, severity: Severity, phrases: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            kind,
            severity,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Evaluate this rule against prepared text.
    fn check(&self, text: &ScanText<'_>) -> ComplianceFinding {
        let hit = self.phrases.iter().find_map(|p| text.snippet_for(p));
        let (status, evidence) = match (self.kind, hit) {
            (RuleKind::MustContain, Some(snippet)) => {
                (FindingStatus::Satisfied, Evidence::Snippet(snippet))
            }
            (RuleKind::MustContain, None) => (FindingStatus::Violated, Evidence::Absent),
            (RuleKind::MustNotContain, Some(snippet)) => {
                (FindingStatus::Violated, Evidence::Snippet(snippet))
            }
            (RuleKind::MustNotContain, None) => (FindingStatus::Satisfied, Evidence::Absent),
        };

        ComplianceFinding {
            requirement_id: self.id.clone(),
            severity: self.severity,
            status,
            evidence,
        }
    }
}

/// A named, versioned list of rules checked in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub rules: Vec<ComplianceRule>,
}

fn default_version() -> String {
    "1".to_string()
}

impl RequirementSet {
    pub fn validate(&self) -> CoreResult<()> {
        let mut ids: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(CoreError::config(format!(
                    "requirement set '{}' has a rule with an empty id",
                    self.name
                )));
            }
            if ids.contains(&rule.id.as_str()) {
                return Err(CoreError::config(format!(
                    "requirement set '{}' defines rule '{}' twice",
                    self.name, rule.id
                )));
            }
            if rule.phrases.is_empty() || rule.phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(CoreError::config(format!(
                    "rule '{}' in requirement set '{}' needs non-empty phrases",
                    rule.id, self.name
                )));
            }
            ids.push(rule.id.as_str());
        }
        Ok(())
    }
}

/// All requirement sets, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementSets {
    sets: BTreeMap<String, RequirementSet>,
}

impl RequirementSets {
    pub fn empty() -> Self {
        Self {
            sets: BTreeMap::new(),
        }
    }

    /// Built-in sets: general, pci_dss, collections, sales.
    pub fn builtin() -> Self {
        use RuleKind::*;
        use Severity::*;

        let general = RequirementSet {
            name: "general".to_string(),
            version: default_version(),
            rules: vec![
                ComplianceRule::new(
                    "call_recording_disclosure",
                    MustContain,
                    High,
                    &[
                        "call may be recorded",
                        "call is being recorded",
                        "this call is recorded",
                        "for quality and training",
                        "chat is being recorded",
                    ],
                ),
                ComplianceRule::new(
                    "identity_verification",
                    MustContain,
                    Medium,
                    &[
                        "verify your identity",
                        "confirm your name",
                        "can you confirm",
                        "for security purposes",
                        "verify your account",
                    ],
                ),
                ComplianceRule::new(
                    "full_card_readback",
                    MustNotContain,
                    Critical,
                    &[
                        "your card number is",
                        "card number is ",
                        "read back your card",
                        "your full card number",
                    ],
                ),
                ComplianceRule::new(
                    "ssn_spoken",
                    MustNotContain,
                    Critical,
                    &["your social security number is", "your ssn is"],
                ),
            ],
        };

        let pci_dss = RequirementSet {
            name: "pci_dss".to_string(),
            version: default_version(),
            rules: vec![
                ComplianceRule::new(
                    "secure_payment_redirect",
                    MustContain,
                    High,
                    &[
                        "secure payment",
                        "transfer you to our payment system",
                        "payment portal",
                        "secure line",
                    ],
                ),
                ComplianceRule::new(
                    "card_number_spoken",
                    MustNotContain,
                    Critical,
                    &[
                        "your card number is",
                        "card number is ",
                        "read back your card",
                        "repeat your card",
                        "full card number",
                    ],
                ),
                ComplianceRule::new(
                    "cvv_spoken",
                    MustNotContain,
                    Critical,
                    &["your cvv is", "security code is", "cvv number is"],
                ),
                ComplianceRule::new(
                    "card_stored",
                    MustNotContain,
                    High,
                    &["we have your card on file", "stored your card", "keep your card"],
                ),
            ],
        };

        let collections = RequirementSet {
            name: "collections".to_string(),
            version: default_version(),
            rules: vec![
                ComplianceRule::new(
                    "mini_miranda",
                    MustContain,
                    Critical,
                    &[
                        "this is an attempt to collect a debt",
                        "any information obtained will be used for that purpose",
                        "debt collector",
                    ],
                ),
                ComplianceRule::new(
                    "right_party_verification",
                    MustContain,
                    High,
                    &["am i speaking with", "is this", "confirm your identity"],
                ),
                ComplianceRule::new(
                    "third_party_disclosure",
                    MustNotContain,
                    Critical,
                    &[
                        "tell them they owe",
                        "inform your family",
                        "let your employer know",
                    ],
                ),
                ComplianceRule::new(
                    "threats",
                    MustNotContain,
                    Critical,
                    &[
                        "we will have you arrested",
                        "go to jail",
                        "sue you",
                        "garnish your wages",
                    ],
                ),
            ],
        };

        let sales = RequirementSet {
            name: "sales".to_string(),
            version: default_version(),
            rules: vec![
                ComplianceRule::new(
                    "terms_and_conditions",
                    MustContain,
                    High,
                    &[
                        "terms and conditions",
                        "terms of service",
                        "by agreeing",
                        "do you accept the terms",
                    ],
                ),
                ComplianceRule::new(
                    "cancellation_policy",
                    MustContain,
                    Medium,
                    &[
                        "cancel within",
                        "cancellation policy",
                        "cooling off period",
                        "money back guarantee",
                    ],
                ),
                ComplianceRule::new(
                    "pricing_disclosure",
                    MustContain,
                    High,
                    &["total cost", "monthly charge", "per month", "billed at", "price is"],
                ),
                ComplianceRule::new(
                    "misleading_claims",
                    MustNotContain,
                    High,
                    &[
                        "guaranteed to",
                        "you will definitely",
                        "100% guaranteed",
                        "no risk at all",
                    ],
                ),
            ],
        };

        let mut sets = Self::empty();
        for set in [general, pci_dss, collections, sales] {
            sets.insert(set);
        }
        sets
    }

    /// Add or replace a set by name.
    pub fn insert(&mut self, set: RequirementSet) {
        self.sets.insert(set.name.clone(), set);
    }

    pub fn get(&self, name: &str) -> CoreResult<&RequirementSet> {
        self.sets
            .get(name)
            .ok_or_else(|| CoreError::unknown_requirement_set(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(|k| k.as_str())
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (key, set) in &self.sets {
            if key != &set.name {
                return Err(CoreError::config(format!(
                    "requirement set registered as '{}' is named '{}'",
                    key, set.name
                )));
            }
            set.validate()?;
        }
        Ok(())
    }
}

impl Default for RequirementSets {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Result of checking one transcript against one requirement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub requirement_set: String,
    /// One finding per rule, in rule order
    pub findings: Vec<ComplianceFinding>,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of satisfied rules, one decimal
    pub compliance_rate: f64,
}

impl ComplianceCheck {
    pub fn has_critical_violation(&self) -> bool {
        self.findings.iter().any(|f| f.is_critical_violation())
    }
}

/// Phrase matcher over a library of requirement sets.
#[derive(Debug, Clone, Default)]
pub struct ComplianceMatcher {
    sets: RequirementSets,
}

impl ComplianceMatcher {
    pub fn new(sets: RequirementSets) -> Self {
        Self { sets }
    }

    pub fn requirement_sets(&self) -> &RequirementSets {
        &self.sets
    }

    /// Check `text` against the set called `set_name`.
    ///
    /// Fails only when the set is unknown.
    pub fn check(&self, text: &str, set_name: &str) -> CoreResult<ComplianceCheck> {
        let set = self.sets.get(set_name)?;
        let scan = ScanText::new(text);

        let findings: Vec<ComplianceFinding> = set.rules.iter().map(|r| r.check(&scan)).collect();
        let passed = findings.iter().filter(|f| !f.is_violation()).count();
        let failed = findings.len() - passed;
        let compliance_rate = if findings.is_empty() {
            100.0
        } else {
            ((passed as f64 / findings.len() as f64) * 1000.0).round() / 10.0
        };

        Ok(ComplianceCheck {
            requirement_set: set.name.clone(),
            findings,
            passed,
            failed,
            compliance_rate,
        })
    }
}
