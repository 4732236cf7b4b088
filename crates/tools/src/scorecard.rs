//! Scorecard Calculator
//!
//! Weighted combination of the four sub-dimension scores under a named
//! weight profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qa_auditor_core::{CoreError, CoreResult, Dimension, PerformanceBand, SubScores};

/// Allowed deviation of a profile's weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-dimension weights of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub name: String,
    pub compliance: f64,
    pub empathy: f64,
    pub resolution: f64,
    #[serde(alias = "process_adherence")]
    pub process: f64,
}

impl WeightProfile {
    pub fn new(name: &str, compliance: f64, empathy: f64, resolution: f64, process: f64) -> Self {
        Self {
            name: name.to_string(),
            compliance,
            empathy,
            resolution,
            process,
        }
    }

    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Compliance => self.compliance,
            Dimension::Empathy => self.empathy,
            Dimension::Resolution => self.resolution,
            Dimension::Process => self.process,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }

    /// Weights must be non-negative and sum to 1.0.
    pub fn validate(&self) -> CoreResult<()> {
        for dimension in Dimension::ALL {
            let w = self.weight(dimension);
            if !w.is_finite() || w < 0.0 {
                return Err(CoreError::config(format!(
                    "weight profile '{}': {} weight must be non-negative, got {}",
                    self.name, dimension, w
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::config(format!(
                "weight profile '{}' sums to {}, expected 1.0",
                self.name, sum
            )));
        }
        Ok(())
    }
}

/// Weight profiles keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightProfiles {
    profiles: BTreeMap<String, WeightProfile>,
}

impl WeightProfiles {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// standard, compliance_heavy and cx_focused.
    pub fn builtin() -> Self {
        let mut profiles = Self::empty();
        profiles.insert(WeightProfile::new("standard", 0.30, 0.25, 0.25, 0.20));
        profiles.insert(WeightProfile::new("compliance_heavy", 0.45, 0.15, 0.20, 0.20));
        profiles.insert(WeightProfile::new("cx_focused", 0.20, 0.35, 0.30, 0.15));
        profiles
    }

    pub fn insert(&mut self, profile: WeightProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> CoreResult<&WeightProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| CoreError::invalid_profile(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (key, profile) in &self.profiles {
            if key != &profile.name {
                return Err(CoreError::config(format!(
                    "weight profile registered as '{}' is named '{}'",
                    key, profile.name
                )));
            }
            profile.validate()?;
        }
        Ok(())
    }
}

impl Default for WeightProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Contribution of one dimension to the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub raw: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Output of the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    /// Weighted overall, one decimal
    pub overall: f64,
    pub band: PerformanceBand,
    pub weight_profile: String,
    pub breakdown: Vec<DimensionScore>,
}

/// Applies weight profiles to sub-scores.
#[derive(Debug, Clone, Default)]
pub struct ScorecardCalculator {
    profiles: WeightProfiles,
}

impl ScorecardCalculator {
    pub fn new(profiles: WeightProfiles) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &WeightProfiles {
        &self.profiles
    }

    /// Combine `scores` under `profile`.
    ///
    /// Returns `InvalidProfile` for an unknown name and `OutOfRange` for any
    /// sub-score outside [0, 100] (NaN included).
    pub fn calculate(&self, scores: &SubScores, profile: &str) -> CoreResult<Scorecard> {
        let weights = self.profiles.get(profile)?;
        check_range(scores)?;

        let breakdown: Vec<DimensionScore> = scores
            .iter()
            .map(|(dimension, raw)| {
                let weight = weights.weight(dimension);
                DimensionScore {
                    dimension,
                    raw,
                    weight,
                    weighted: raw * weight,
                }
            })
            .collect();

        let total: f64 = breakdown.iter().map(|d| d.weighted).sum();
        let overall = round_one_decimal(total);

        Ok(Scorecard {
            overall,
            band: PerformanceBand::from_score(overall),
            weight_profile: weights.name.clone(),
            breakdown,
        })
    }
}

/// Reject sub-scores outside [0, 100].
pub fn check_range(scores: &SubScores) -> CoreResult<()> {
    for (dimension, value) in scores.iter() {
        if !(0.0..=100.0).contains(&value) {
            return Err(CoreError::out_of_range(dimension.as_str(), value));
        }
    }
    Ok(())
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
