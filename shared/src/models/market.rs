//! Market pricing models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DataOrigin, Recommendation};

/// Point-in-time market conditions for a crop at a location, as supplied
/// by the market-snapshot collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    /// Current wholesale price per kilogram
    pub price_per_kg: Decimal,
    /// Relative demand index (arbitrary positive units)
    pub demand_index: f64,
    /// Relative supply index (same units as demand)
    pub supply_index: f64,
    pub recorded_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Demand pressure in [-1, 1]: positive when demand outstrips supply
    pub fn demand_pressure(&self) -> f64 {
        let total = self.demand_index + self.supply_index;
        if total <= 0.0 {
            return 0.0;
        }
        ((self.demand_index - self.supply_index) / total).clamp(-1.0, 1.0)
    }
}

/// Pricing strategy derived from the final multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// multiplier > 1.05
    Premium,
    /// multiplier in [0.95, 1.05]
    MarketRate,
    /// multiplier in [0.70, 0.95)
    Discount,
    /// multiplier < 0.70
    Clearance,
}

impl std::fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingStrategy::Premium => write!(f, "Premium"),
            PricingStrategy::MarketRate => write!(f, "Market Rate"),
            PricingStrategy::Discount => write!(f, "Discount"),
            PricingStrategy::Clearance => write!(f, "Clearance"),
        }
    }
}

/// Classify a final multiplier into its strategy label
pub fn classify_strategy(multiplier: f64) -> PricingStrategy {
    if multiplier > 1.05 {
        PricingStrategy::Premium
    } else if multiplier >= 0.95 {
        PricingStrategy::MarketRate
    } else if multiplier >= 0.70 {
        PricingStrategy::Discount
    } else {
        PricingStrategy::Clearance
    }
}

/// Short-term price direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Stable,
    Falling,
}

/// Result of the market pricing stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketResult {
    pub base_price_per_kg: Decimal,
    pub multiplier: f64,
    pub final_price_per_kg: Decimal,
    pub strategy: PricingStrategy,
    pub trend: PriceTrend,
    pub origin: DataOrigin,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_boundaries() {
        assert_eq!(classify_strategy(1.06), PricingStrategy::Premium);
        assert_eq!(classify_strategy(1.05), PricingStrategy::MarketRate);
        assert_eq!(classify_strategy(0.95), PricingStrategy::MarketRate);
        assert_eq!(classify_strategy(0.949), PricingStrategy::Discount);
        assert_eq!(classify_strategy(0.70), PricingStrategy::Discount);
        assert_eq!(classify_strategy(0.50), PricingStrategy::Clearance);
    }

    #[test]
    fn demand_pressure_is_bounded() {
        let snapshot = MarketSnapshot {
            price_per_kg: Decimal::new(5000, 2),
            demand_index: 90.0,
            supply_index: 10.0,
            recorded_at: Utc::now(),
        };
        assert!(snapshot.demand_pressure() > 0.0);
        assert!(snapshot.demand_pressure() <= 1.0);

        let balanced = MarketSnapshot {
            demand_index: 50.0,
            supply_index: 50.0,
            ..snapshot
        };
        assert_eq!(balanced.demand_pressure(), 0.0);
    }
}
