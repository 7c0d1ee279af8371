//! Logistics selection stage
//!
//! Picks the delivery mode from the freshness score, then filters and
//! ranks driver candidates from the registry. An unreachable registry
//! yields an empty ranking, never a stage failure.

use std::cmp::Ordering;
use std::sync::Arc;

use shared::{
    AssessmentRequest, DeliveryMode, DriverCandidate, DriverScoreFactors, DriverStatus,
    FreshnessResult, LogisticsResult, RankedDriver, Recommendation, Severity, Stage, VehicleType,
};
use tracing::warn;

use crate::config::LogisticsStageConfig;
use crate::error::PipelineResult;
use crate::external::DriverRegistry;
use crate::stages::StageOutcome;

const CAPACITY_WEIGHT: f64 = 0.30;
const RATING_WEIGHT: f64 = 0.20;
const VEHICLE_WEIGHT: f64 = 0.20;
const AVAILABILITY_WEIGHT: f64 = 0.10;
// Proximity carries the remaining 20% as a reserved term that scores zero
// for every candidate; the other weights are not renormalized.
const PROXIMITY_WEIGHT: f64 = 0.20;

const MAX_RATING: f64 = 5.0;

/// Logistics selector
#[derive(Clone)]
pub struct LogisticsSelector {
    registry: Arc<dyn DriverRegistry>,
    config: LogisticsStageConfig,
}

impl LogisticsSelector {
    /// Create a new LogisticsSelector
    pub fn new(registry: Arc<dyn DriverRegistry>, config: LogisticsStageConfig) -> Self {
        Self { registry, config }
    }

    /// Select the delivery mode and rank drivers for a consignment
    pub async fn select(
        &self,
        request: &AssessmentRequest,
        freshness: &FreshnessResult,
    ) -> PipelineResult<StageOutcome<LogisticsResult>> {
        let mode = mode_for_score(freshness.score);
        let min_capacity = request.quantity_kg * self.config.capacity_buffer;
        let premium = mode == DeliveryMode::ColdChain;

        let (candidates, registry_reachable) = match self
            .registry
            .query(&request.location, min_capacity, mode)
            .await
        {
            Ok(candidates) => (candidates, true),
            Err(err) => {
                warn!(location = %request.location, error = %err,
                    "driver registry unreachable, proceeding without candidates");
                (Vec::new(), false)
            }
        };

        let ranked = self.rank(candidates, mode, min_capacity, premium);
        let insufficient_supply = ranked.len() < self.config.min_candidates;

        let result = LogisticsResult {
            mode,
            cost_multiplier: mode.cost_multiplier(),
            recommendations: self.build_recommendations(
                request,
                mode,
                insufficient_supply,
                registry_reachable,
            ),
            ranked_drivers: ranked,
            insufficient_supply,
        };

        Ok(if registry_reachable {
            StageOutcome::live(result)
        } else {
            StageOutcome::fallback(result)
        })
    }

    /// Enforce premium handling for a high-value consignment
    ///
    /// Upgrades a selection to at least refrigerated transport and
    /// re-ranks the already-eligible candidates under the premium rating
    /// rule. Called by the orchestrator once the market stage has priced
    /// the lot above the premium threshold.
    pub fn apply_price_floor(
        &self,
        request: &AssessmentRequest,
        result: LogisticsResult,
    ) -> LogisticsResult {
        let upgraded_mode = if result.mode.rank() < DeliveryMode::Refrigerated.rank() {
            DeliveryMode::Refrigerated
        } else {
            result.mode
        };
        let min_capacity = request.quantity_kg * self.config.capacity_buffer;

        let candidates: Vec<DriverCandidate> = result
            .ranked_drivers
            .into_iter()
            .map(|r| r.driver)
            .collect();
        let ranked = self.rank(candidates, upgraded_mode, min_capacity, true);
        let insufficient_supply = ranked.len() < self.config.min_candidates;

        let mut recommendations = result.recommendations;
        if upgraded_mode != result.mode {
            recommendations.push(Recommendation::new(
                Severity::High,
                Stage::Logistics,
                "High-value consignment: refrigerated transport enforced",
            ));
        }

        LogisticsResult {
            mode: upgraded_mode,
            cost_multiplier: upgraded_mode.cost_multiplier(),
            ranked_drivers: ranked,
            insufficient_supply,
            recommendations,
        }
    }

    /// Filter to eligible candidates and rank them by composite score
    fn rank(
        &self,
        candidates: Vec<DriverCandidate>,
        mode: DeliveryMode,
        min_capacity_kg: f64,
        premium: bool,
    ) -> Vec<RankedDriver> {
        let mut ranked: Vec<RankedDriver> = candidates
            .into_iter()
            .filter(|d| self.is_eligible(d, min_capacity_kg, premium))
            .map(|driver| {
                let factors = score_factors(&driver, mode, min_capacity_kg);
                let composite_score = composite(&factors);
                RankedDriver {
                    driver,
                    composite_score,
                    factors,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.driver
                        .capacity_kg
                        .partial_cmp(&a.driver.capacity_kg)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.driver.id.cmp(&b.driver.id))
        });

        ranked
    }

    fn is_eligible(&self, driver: &DriverCandidate, min_capacity_kg: f64, premium: bool) -> bool {
        if driver.status != DriverStatus::Available {
            return false;
        }
        if driver.capacity_kg < min_capacity_kg {
            return false;
        }
        if driver.distance_km > self.config.max_distance_km {
            return false;
        }
        if premium && driver.rating < self.config.min_premium_rating {
            return false;
        }
        true
    }

    fn build_recommendations(
        &self,
        request: &AssessmentRequest,
        mode: DeliveryMode,
        insufficient_supply: bool,
        registry_reachable: bool,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if mode == DeliveryMode::ColdChain {
            recommendations.push(Recommendation::new(
                Severity::High,
                Stage::Logistics,
                "Cold-chain transport is mandatory for this lot",
            ));
        }

        if !registry_reachable {
            recommendations.push(Recommendation::new(
                Severity::Medium,
                Stage::Logistics,
                "Driver registry unreachable; no candidates could be ranked",
            ));
        } else if insufficient_supply {
            recommendations.push(Recommendation::new(
                Severity::Medium,
                Stage::Logistics,
                format!(
                    "Fewer than {} eligible drivers near {}; consider widening the search",
                    self.config.min_candidates, request.location
                ),
            ));
        }

        recommendations
    }
}

/// Delivery mode mandated by the freshness score
pub fn mode_for_score(score: f64) -> DeliveryMode {
    if score < 40.0 {
        DeliveryMode::ColdChain
    } else if score <= 70.0 {
        DeliveryMode::Refrigerated
    } else {
        DeliveryMode::Standard
    }
}

fn score_factors(driver: &DriverCandidate, mode: DeliveryMode, min_capacity_kg: f64) -> DriverScoreFactors {
    let capacity_match = if driver.capacity_kg > 0.0 {
        (min_capacity_kg / driver.capacity_kg).clamp(0.0, 1.0)
    } else {
        0.0
    };

    DriverScoreFactors {
        capacity_match,
        rating: (driver.rating / MAX_RATING).clamp(0.0, 1.0),
        vehicle_match: vehicle_match(driver.vehicle, mode),
        availability: if driver.status == DriverStatus::Available {
            1.0
        } else {
            0.0
        },
        proximity: 0.0,
    }
}

fn composite(factors: &DriverScoreFactors) -> f64 {
    CAPACITY_WEIGHT * factors.capacity_match
        + RATING_WEIGHT * factors.rating
        + VEHICLE_WEIGHT * factors.vehicle_match
        + AVAILABILITY_WEIGHT * factors.availability
        + PROXIMITY_WEIGHT * factors.proximity
}

/// How well a vehicle category serves the selected delivery mode
fn vehicle_match(vehicle: VehicleType, mode: DeliveryMode) -> f64 {
    match (mode, vehicle) {
        (DeliveryMode::ColdChain, VehicleType::Refrigerated) => 1.0,
        (DeliveryMode::ColdChain, VehicleType::Insulated) => 0.3,
        (DeliveryMode::ColdChain, VehicleType::Open) => 0.0,
        (DeliveryMode::Refrigerated, VehicleType::Refrigerated) => 1.0,
        (DeliveryMode::Refrigerated, VehicleType::Insulated) => 0.7,
        (DeliveryMode::Refrigerated, VehicleType::Open) => 0.2,
        (DeliveryMode::Standard, _) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_thresholds() {
        assert_eq!(mode_for_score(39.999), DeliveryMode::ColdChain);
        assert_eq!(mode_for_score(40.0), DeliveryMode::Refrigerated);
        assert_eq!(mode_for_score(70.0), DeliveryMode::Refrigerated);
        assert_eq!(mode_for_score(70.001), DeliveryMode::Standard);
    }

    #[test]
    fn cost_multipliers_follow_mode() {
        assert_eq!(DeliveryMode::ColdChain.cost_multiplier(), 1.5);
        assert_eq!(DeliveryMode::Refrigerated.cost_multiplier(), 1.3);
        assert_eq!(DeliveryMode::Standard.cost_multiplier(), 1.0);
    }

    #[test]
    fn composite_weights_sum_to_eighty_percent_plus_reserve() {
        let full = DriverScoreFactors {
            capacity_match: 1.0,
            rating: 1.0,
            vehicle_match: 1.0,
            availability: 1.0,
            proximity: 1.0,
        };
        assert!((composite(&full) - 1.0).abs() < 1e-9);

        let no_proximity = DriverScoreFactors {
            proximity: 0.0,
            ..full
        };
        assert!((composite(&no_proximity) - 0.8).abs() < 1e-9);
    }
}
