//! QA Auditor Tools
//!
//! The deterministic analysis tools. Every tool is a plain value holding its
//! configuration tables; calls take borrowed input and return new records,
//! so tools can be shared freely across worker tasks.
//!
//! ## Module Organization
//!
//! - `red_flag` - Keyword scanner producing `RiskScore`s
//! - `compliance` - Requirement-set phrase matcher producing findings
//! - `scorecard` - Weighted overall score under a named profile
//! - `patterns` - Cross-agent pattern aggregation and coaching selection
//! - `rulebook` - Built-in tables and TOML overrides
//! - `text` - Case-insensitive lookup and snippet extraction

pub mod compliance;
pub mod patterns;
pub mod red_flag;
pub mod rulebook;
pub mod scorecard;
pub mod text;

pub use compliance::{
    ComplianceCheck, ComplianceMatcher, ComplianceRule, RequirementSet, RequirementSets, RuleKind,
};
pub use patterns::{PatternAggregator, PatternReport, PatternThresholds};
pub use red_flag::{
    DisclosureRule, KeywordGroup, KeywordTable, RedFlagScanner, RiskThresholds, SeverityWeights,
    NO_DISCLOSURE_MARKER,
};
pub use rulebook::RuleBook;
pub use scorecard::{
    check_range, round_one_decimal, DimensionScore, Scorecard, ScorecardCalculator, WeightProfile,
    WeightProfiles, WEIGHT_SUM_TOLERANCE,
};
pub use text::{ScanText, SNIPPET_RADIUS};
