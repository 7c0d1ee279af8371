//! Weather assessment models

use serde::{Deserialize, Serialize};

use crate::types::Recommendation;

/// One forecast step as supplied by the forecast collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    /// Hours from now this point describes
    pub lead_hours: u32,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub wind_speed_mps: f64,
    pub condition: String,
}

/// Weather risk level derived from the degradation delta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherRisk {
    /// delta < 5
    Low,
    /// delta < 15
    Medium,
    /// delta < 30
    High,
    /// delta >= 30
    Critical,
}

impl std::fmt::Display for WeatherRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherRisk::Low => write!(f, "Low"),
            WeatherRisk::Medium => write!(f, "Medium"),
            WeatherRisk::High => write!(f, "High"),
            WeatherRisk::Critical => write!(f, "Critical"),
        }
    }
}

/// Classify a degradation delta into its risk level
pub fn classify_weather_risk(delta: f64) -> WeatherRisk {
    if delta < 5.0 {
        WeatherRisk::Low
    } else if delta < 15.0 {
        WeatherRisk::Medium
    } else if delta < 30.0 {
        WeatherRisk::High
    } else {
        WeatherRisk::Critical
    }
}

/// Where the forecast driving the assessment came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    Live,
    /// Seasonal baseline substituted because the forecast collaborator
    /// was unavailable
    Simulated,
}

/// Result of the weather stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherResult {
    /// Percentage points to subtract from the freshness score, >= 0
    pub degradation_delta: f64,
    pub risk: WeatherRisk,
    pub source: ForecastSource,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_thresholds() {
        assert_eq!(classify_weather_risk(0.0), WeatherRisk::Low);
        assert_eq!(classify_weather_risk(4.999), WeatherRisk::Low);
        assert_eq!(classify_weather_risk(5.0), WeatherRisk::Medium);
        assert_eq!(classify_weather_risk(15.0), WeatherRisk::High);
        assert_eq!(classify_weather_risk(30.0), WeatherRisk::Critical);
    }
}
