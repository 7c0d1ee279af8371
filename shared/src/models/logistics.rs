//! Logistics and driver matching models

use serde::{Deserialize, Serialize};

use crate::types::Recommendation;

/// Transport mode for a consignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Full cold chain, mandatory for fragile consignments
    ColdChain,
    Refrigerated,
    Standard,
}

impl DeliveryMode {
    /// Transport cost multiplier for this mode
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            DeliveryMode::ColdChain => 1.5,
            DeliveryMode::Refrigerated => 1.3,
            DeliveryMode::Standard => 1.0,
        }
    }

    /// Numeric rank for mode comparison (higher is more protective)
    pub fn rank(&self) -> u8 {
        match self {
            DeliveryMode::ColdChain => 3,
            DeliveryMode::Refrigerated => 2,
            DeliveryMode::Standard => 1,
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::ColdChain => write!(f, "Cold Chain"),
            DeliveryMode::Refrigerated => write!(f, "Refrigerated"),
            DeliveryMode::Standard => write!(f, "Standard"),
        }
    }
}

/// Vehicle category registered for a driver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Refrigerated,
    Insulated,
    Open,
}

/// Driver availability as reported by the registry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    OnTrip,
    Offline,
}

/// A driver candidate as supplied by the registry collaborator
///
/// Distance is registered data from the collaborator; the pipeline never
/// derives it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverCandidate {
    pub id: String,
    pub name: String,
    pub capacity_kg: f64,
    /// Rating on a 0-5 scale
    pub rating: f64,
    pub vehicle: VehicleType,
    pub status: DriverStatus,
    pub distance_km: f64,
    pub location: String,
}

/// Normalized scoring factors for one driver, each in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DriverScoreFactors {
    pub capacity_match: f64,
    pub rating: f64,
    pub vehicle_match: f64,
    pub availability: f64,
    /// Reserved weighting term, zero for every candidate
    pub proximity: f64,
}

/// A ranked driver with its composite score and factor breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedDriver {
    pub driver: DriverCandidate,
    pub composite_score: f64,
    pub factors: DriverScoreFactors,
}

/// Result of the logistics stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticsResult {
    pub mode: DeliveryMode,
    pub cost_multiplier: f64,
    pub ranked_drivers: Vec<RankedDriver>,
    /// Set when the registry held fewer than the minimum eligible
    /// candidates; not a stage failure
    pub insufficient_supply: bool,
    pub recommendations: Vec<Recommendation>,
}
