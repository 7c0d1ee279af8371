//! Final assessment model

use serde::{Deserialize, Serialize};

use crate::models::{FreshnessResult, LogisticsResult, MarketResult, WeatherResult};
use crate::types::Recommendation;

/// How a stage's data entered the final assessment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageDisposition {
    /// Computed from live collaborator data
    Live,
    /// Computed from cached/simulated fallback data
    Fallback,
    /// The stage produced no result; a neutral default was substituted
    Defaulted,
}

/// Per-stage dispositions for the audit trail
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageDispositions {
    pub freshness: StageDisposition,
    pub market: StageDisposition,
    pub logistics: StageDisposition,
    pub weather: StageDisposition,
}

impl StageDispositions {
    pub fn all_live(&self) -> bool {
        [self.freshness, self.market, self.logistics, self.weather]
            .iter()
            .all(|d| *d == StageDisposition::Live)
    }

    pub fn fallback_count(&self) -> usize {
        [self.freshness, self.market, self.logistics, self.weather]
            .iter()
            .filter(|d| **d == StageDisposition::Fallback)
            .count()
    }

    pub fn default_count(&self) -> usize {
        [self.freshness, self.market, self.logistics, self.weather]
            .iter()
            .filter(|d| **d == StageDisposition::Defaulted)
            .count()
    }
}

/// References to all four stage results, kept for audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageAudit {
    pub freshness: FreshnessResult,
    pub market: MarketResult,
    pub logistics: LogisticsResult,
    pub weather: WeatherResult,
    pub dispositions: StageDispositions,
}

/// Overall outcome of a completed workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Every stage ran against live data within budget
    Completed,
    /// At least one fallback, neutral default or deadline hit
    Degraded,
}

/// The composed decision bundle returned to the caller
///
/// Created exactly once per completed workflow and never mutated. Carries
/// no run identifier or timestamps: identical inputs against unchanged
/// collaborator state produce value-identical assessments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalAssessment {
    pub crop: String,
    pub location: String,
    /// Freshness score minus the weather degradation delta, floored at 0
    pub adjusted_score: f64,
    /// Product of per-stage confidence weights, in [0, 1]
    pub confidence: f64,
    pub status: AssessmentStatus,
    /// Whether the run deadline elapsed before every stage finished
    pub deadline_hit: bool,
    /// Merged, deduplicated recommendations ordered by severity
    pub recommendations: Vec<Recommendation>,
    pub audit: StageAudit,
}
