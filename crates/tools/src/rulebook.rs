//! Rule Book
//!
//! The versionable data tables behind the deterministic tools: keyword
//! table, requirement sets and weight profiles. Built-in tables are always
//! present; a TOML file can replace the keyword table and add or override
//! requirement sets and weight profiles by name.
//!
//! ```toml
//! [[requirement_sets]]
//! name = "general"
//! version = "2"
//!
//! [[requirement_sets.rules]]
//! id = "call_recording_disclosure"
//! kind = "must_contain"
//! severity = "HIGH"
//! phrases = ["call may be recorded"]
//!
//! [[weight_profiles]]
//! name = "retention"
//! compliance = 0.25
//! empathy = 0.35
//! resolution = 0.30
//! process = 0.10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use qa_auditor_core::{CoreError, CoreResult};

use crate::compliance::{RequirementSet, RequirementSets};
use crate::red_flag::KeywordTable;
use crate::scorecard::{WeightProfile, WeightProfiles};

/// On-disk shape of a rule book override file.
#[derive(Debug, Default, Deserialize)]
struct RuleBookFile {
    #[serde(default)]
    keywords: Option<KeywordTable>,
    #[serde(default)]
    requirement_sets: Vec<RequirementSet>,
    #[serde(default)]
    weight_profiles: Vec<WeightProfile>,
}

/// All configuration tables used by the tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleBook {
    pub keywords: KeywordTable,
    pub requirement_sets: RequirementSets,
    pub weight_profiles: WeightProfiles,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            keywords: KeywordTable::default(),
            requirement_sets: RequirementSets::builtin(),
            weight_profiles: WeightProfiles::builtin(),
        }
    }
}

impl RuleBook {
    /// Parse overrides from TOML and merge them over the built-in tables.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let file: RuleBookFile = toml::from_str(content)
            .map_err(|e| CoreError::config(format!("invalid rule book: {}", e)))?;

        let mut book = Self::default();
        if let Some(keywords) = file.keywords {
            book.keywords = keywords;
        }
        for set in file.requirement_sets {
            book.requirement_sets.insert(set);
        }
        for profile in file.weight_profiles {
            book.weight_profiles.insert(profile);
        }

        book.validate()?;
        Ok(book)
    }

    /// Load overrides from a TOML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let book = Self::from_toml_str(&content)?;
        info!(
            "[RuleBook] Loaded {} ({} requirement sets, {} weight profiles)",
            path.display(),
            book.requirement_sets.names().count(),
            book.weight_profiles.names().count()
        );
        Ok(book)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.keywords.validate()?;
        self.requirement_sets.validate()?;
        self.weight_profiles.validate()?;
        Ok(())
    }
}
