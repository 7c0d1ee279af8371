//! Common types used across the pipeline

use serde::{Deserialize, Serialize};

/// Urgency of a delivery request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Severity of a recommendation, ordered CRITICAL > HIGH > MEDIUM > LOW
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank for ordering (higher is more severe)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

/// The four scoring stages of the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Freshness,
    Market,
    Logistics,
    Weather,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Freshness => write!(f, "freshness"),
            Stage::Market => write!(f, "market"),
            Stage::Logistics => write!(f, "logistics"),
            Stage::Weather => write!(f, "weather"),
        }
    }
}

/// Whether a stage result was computed from live collaborator data or a
/// local fallback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,
    Fallback,
}

/// An actionable recommendation emitted by a stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub severity: Severity,
    pub source: Stage,
    pub message: String,
}

impl Recommendation {
    pub fn new(severity: Severity, source: Stage, message: impl Into<String>) -> Self {
        Self {
            severity,
            source,
            message: message.into(),
        }
    }
}
