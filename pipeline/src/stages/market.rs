//! Market pricing stage
//!
//! Turns the freshness outcome and a market snapshot into a price
//! recommendation. Snapshot unavailability is recovered with last-known
//! reference prices; this stage never fails a run outright.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{
    classify_strategy, AssessmentRequest, CropProfile, DataOrigin, FreshnessLevel, FreshnessResult,
    MarketResult, MarketSnapshot, PriceTrend, PricingStrategy, Recommendation, Severity, Stage,
    UrgencyLevel,
};
use tracing::warn;

use crate::config::MarketStageConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::external::MarketDataSource;
use crate::stages::StageOutcome;

const FRESHNESS_ADJ_LIMIT: f64 = 0.20;
const DEMAND_ADJ_LIMIT: f64 = 0.15;
const URGENCY_ADJ_LIMIT: f64 = 0.15;
const MULTIPLIER_FLOOR: f64 = 0.70;
const MULTIPLIER_CEILING: f64 = 1.20;
const EMERGENCY_SALE_CAP: f64 = 0.50;
const BULK_QUANTITY_KG: f64 = 100.0;
const BULK_DISCOUNT: f64 = 0.95;

/// Market pricer
#[derive(Clone)]
pub struct MarketPricer {
    source: Arc<dyn MarketDataSource>,
    config: MarketStageConfig,
}

impl MarketPricer {
    /// Create a new MarketPricer
    pub fn new(source: Arc<dyn MarketDataSource>, config: MarketStageConfig) -> Self {
        Self { source, config }
    }

    /// Price a consignment from its freshness outcome and market snapshot
    pub async fn price(
        &self,
        request: &AssessmentRequest,
        freshness: &FreshnessResult,
        profile: &CropProfile,
    ) -> PipelineResult<StageOutcome<MarketResult>> {
        let snapshot = match self.source.snapshot(&request.crop, &request.location).await {
            Ok(found) => found,
            Err(err) => {
                warn!(crop = %request.crop, location = %request.location, error = %err,
                    "market snapshot unavailable, falling back to reference price");
                None
            }
        };

        if let Some(s) = &snapshot {
            if s.price_per_kg <= Decimal::ZERO {
                return Err(PipelineError::StageExecution {
                    stage: Stage::Market,
                    reason: format!("non-positive snapshot price {}", s.price_per_kg),
                });
            }
        }

        let origin = if snapshot.is_some() {
            DataOrigin::Live
        } else {
            DataOrigin::Fallback
        };
        let base_price = snapshot
            .as_ref()
            .map(|s| s.price_per_kg)
            .unwrap_or_else(|| self.fallback_price(&request.crop));
        let demand_pressure = snapshot.as_ref().map(MarketSnapshot::demand_pressure);

        let multiplier = compute_multiplier(
            freshness.level,
            profile.price_sensitivity,
            demand_pressure.unwrap_or(0.0),
            request.urgency,
            request.quantity_kg,
        );
        let strategy = classify_strategy(multiplier);
        let trend = trend_for_pressure(demand_pressure);

        let final_price = (base_price
            * Decimal::from_f64_retain(multiplier).unwrap_or(Decimal::ONE))
        .round_dp(2);

        let result = MarketResult {
            base_price_per_kg: base_price,
            multiplier,
            final_price_per_kg: final_price,
            strategy,
            trend,
            origin,
            recommendations: build_recommendations(strategy, origin),
        };

        Ok(match origin {
            DataOrigin::Live => StageOutcome::live(result),
            DataOrigin::Fallback => StageOutcome::fallback(result),
        })
    }

    /// Last-known reference price for a crop, or the configured static
    /// default
    fn fallback_price(&self, crop: &str) -> Decimal {
        let last_known = match crop.to_lowercase().as_str() {
            "tomato" => Some(Decimal::new(40, 0)),
            "potato" => Some(Decimal::new(22, 0)),
            "onion" => Some(Decimal::new(28, 0)),
            "spinach" => Some(Decimal::new(50, 0)),
            "mango" => Some(Decimal::new(120, 0)),
            "banana" => Some(Decimal::new(35, 0)),
            _ => None,
        };
        last_known.unwrap_or_else(|| {
            Decimal::from_f64_retain(self.config.fallback_price_per_kg).unwrap_or(Decimal::new(30, 0))
        })
    }
}

/// Compose the final multiplier from the three clamped adjustments and the
/// post-clamp business rules
fn compute_multiplier(
    level: FreshnessLevel,
    price_sensitivity: f64,
    demand_pressure: f64,
    urgency: UrgencyLevel,
    quantity_kg: f64,
) -> f64 {
    let freshness_adj = (freshness_base_adjustment(level) * price_sensitivity)
        .clamp(-FRESHNESS_ADJ_LIMIT, FRESHNESS_ADJ_LIMIT);
    let demand_adj = (DEMAND_ADJ_LIMIT * demand_pressure).clamp(-DEMAND_ADJ_LIMIT, DEMAND_ADJ_LIMIT);
    let urgency_adj = urgency_adjustment(urgency).clamp(-URGENCY_ADJ_LIMIT, URGENCY_ADJ_LIMIT);

    let mut multiplier =
        (1.0 + freshness_adj + demand_adj + urgency_adj).clamp(MULTIPLIER_FLOOR, MULTIPLIER_CEILING);

    // Bulk consignments take a further discount after the band clamp
    if quantity_kg > BULK_QUANTITY_KG {
        multiplier = (multiplier * BULK_DISCOUNT).clamp(MULTIPLIER_FLOOR, MULTIPLIER_CEILING);
    }

    // Emergency sale: critical lots are cleared regardless of demand
    if level == FreshnessLevel::Critical {
        multiplier = multiplier.min(EMERGENCY_SALE_CAP);
    }

    multiplier
}

fn freshness_base_adjustment(level: FreshnessLevel) -> f64 {
    match level {
        FreshnessLevel::Excellent => 0.15,
        FreshnessLevel::Good => 0.05,
        FreshnessLevel::Fair => -0.05,
        FreshnessLevel::Poor => -0.15,
        FreshnessLevel::Critical => -0.20,
    }
}

fn urgency_adjustment(urgency: UrgencyLevel) -> f64 {
    match urgency {
        UrgencyLevel::Low => -0.05,
        UrgencyLevel::Medium => 0.0,
        UrgencyLevel::High => 0.10,
    }
}

fn trend_for_pressure(pressure: Option<f64>) -> PriceTrend {
    match pressure {
        Some(p) if p > 0.15 => PriceTrend::Rising,
        Some(p) if p < -0.15 => PriceTrend::Falling,
        _ => PriceTrend::Stable,
    }
}

fn build_recommendations(strategy: PricingStrategy, origin: DataOrigin) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    match strategy {
        PricingStrategy::Premium => recommendations.push(Recommendation::new(
            Severity::Low,
            Stage::Market,
            "Market conditions support premium pricing",
        )),
        PricingStrategy::Clearance => recommendations.push(Recommendation::new(
            Severity::High,
            Stage::Market,
            "List the lot for immediate clearance sale",
        )),
        _ => {}
    }

    if origin == DataOrigin::Fallback {
        recommendations.push(Recommendation::new(
            Severity::Medium,
            Stage::Market,
            "Live market data unavailable; price is based on the last known reference",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_stays_in_absolute_bounds() {
        for level in [
            FreshnessLevel::Excellent,
            FreshnessLevel::Good,
            FreshnessLevel::Fair,
            FreshnessLevel::Poor,
            FreshnessLevel::Critical,
        ] {
            for pressure in [-1.0, -0.5, 0.0, 0.5, 1.0] {
                for urgency in [UrgencyLevel::Low, UrgencyLevel::Medium, UrgencyLevel::High] {
                    for quantity in [10.0, 100.0, 500.0] {
                        let m = compute_multiplier(level, 1.2, pressure, urgency, quantity);
                        assert!((0.50..=1.20).contains(&m), "multiplier {} out of bounds", m);
                    }
                }
            }
        }
    }

    #[test]
    fn critical_freshness_caps_at_emergency_sale() {
        let m = compute_multiplier(FreshnessLevel::Critical, 1.0, 1.0, UrgencyLevel::High, 10.0);
        assert!(m <= EMERGENCY_SALE_CAP);
        assert_eq!(classify_strategy(m), PricingStrategy::Clearance);
    }

    #[test]
    fn bulk_quantity_discount_applies_above_threshold() {
        let at_limit = compute_multiplier(FreshnessLevel::Good, 1.0, 0.0, UrgencyLevel::Medium, 100.0);
        let bulk = compute_multiplier(FreshnessLevel::Good, 1.0, 0.0, UrgencyLevel::Medium, 101.0);
        assert!(bulk < at_limit);
    }
}
