//! Freshness scoring models

use serde::{Deserialize, Serialize};

use crate::types::Recommendation;

/// Freshness level classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessLevel {
    /// score >= 80
    Excellent,
    /// score >= 60
    Good,
    /// score >= 40
    Fair,
    /// score >= 20
    Poor,
    /// score < 20
    Critical,
}

impl std::fmt::Display for FreshnessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FreshnessLevel::Excellent => write!(f, "Excellent"),
            FreshnessLevel::Good => write!(f, "Good"),
            FreshnessLevel::Fair => write!(f, "Fair"),
            FreshnessLevel::Poor => write!(f, "Poor"),
            FreshnessLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Classify a freshness score against the fixed level thresholds
pub fn classify_freshness(score: f64) -> FreshnessLevel {
    if score >= 80.0 {
        FreshnessLevel::Excellent
    } else if score >= 60.0 {
        FreshnessLevel::Good
    } else if score >= 40.0 {
        FreshnessLevel::Fair
    } else if score >= 20.0 {
        FreshnessLevel::Poor
    } else {
        FreshnessLevel::Critical
    }
}

/// Per-factor sub-scores feeding the composite freshness score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FreshnessFactors {
    pub temperature: f64,
    pub humidity: f64,
    pub age: f64,
}

/// Result of the freshness stage
///
/// Produced once per request and immutable afterwards; the market and
/// logistics stages read it but never modify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreshnessResult {
    pub score: f64,
    pub level: FreshnessLevel,
    pub factors: FreshnessFactors,
    pub recommendations: Vec<Recommendation>,
}
