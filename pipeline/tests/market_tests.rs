//! Market pricer tests
//!
//! Covers the multiplier band, the emergency-sale cap, the bulk discount,
//! strategy labels, and the fallback path when the snapshot source is
//! unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crop_assessment_pipeline::catalog::CropProfileCatalog;
use crop_assessment_pipeline::config::PipelineConfig;
use crop_assessment_pipeline::error::{PipelineError, PipelineResult};
use crop_assessment_pipeline::external::MarketDataSource;
use crop_assessment_pipeline::stages::{FreshnessScorer, MarketPricer};
use shared::{
    AssessmentRequest, DataOrigin, FreshnessResult, MarketSnapshot, PricingStrategy, Stage,
    UrgencyLevel,
};

/// Source that always returns a fixed snapshot
struct FixedSource {
    snapshot: MarketSnapshot,
}

#[async_trait]
impl MarketDataSource for FixedSource {
    async fn snapshot(&self, _crop: &str, _location: &str) -> PipelineResult<Option<MarketSnapshot>> {
        Ok(Some(self.snapshot.clone()))
    }
}

/// Source that is always unreachable
struct DownSource;

#[async_trait]
impl MarketDataSource for DownSource {
    async fn snapshot(&self, _crop: &str, _location: &str) -> PipelineResult<Option<MarketSnapshot>> {
        Err(PipelineError::StageUnavailable {
            stage: Stage::Market,
            reason: "connection refused".to_string(),
        })
    }
}

fn snapshot(price: i64, demand: f64, supply: f64) -> MarketSnapshot {
    MarketSnapshot {
        price_per_kg: Decimal::new(price, 0),
        demand_index: demand,
        supply_index: supply,
        recorded_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn pricer(source: Arc<dyn MarketDataSource>) -> MarketPricer {
    MarketPricer::new(source, PipelineConfig::default().market)
}

fn freshness_for(request: &AssessmentRequest) -> FreshnessResult {
    let catalog = CropProfileCatalog::with_defaults();
    FreshnessScorer::new().score(request, &catalog.profile_for(&request.crop))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Excellent freshness with strong demand prices at a premium
    #[tokio::test]
    async fn excellent_lot_in_strong_demand_is_premium() {
        let mut request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        request.age_hours = 2.0;
        request.quantity_kg = 100.0;
        let freshness = freshness_for(&request);

        let catalog = CropProfileCatalog::with_defaults();
        let pricer = pricer(Arc::new(FixedSource {
            snapshot: snapshot(50, 80.0, 40.0),
        }));
        let outcome = pricer
            .price(&request, &freshness, &catalog.profile_for("tomato"))
            .await
            .unwrap();

        assert!(!outcome.fallback_used);
        assert_eq!(outcome.value.strategy, PricingStrategy::Premium);
        assert!(outcome.value.multiplier > 1.05);
        assert_eq!(outcome.value.origin, DataOrigin::Live);
    }

    /// Critical freshness forces the emergency-sale cap and clearance
    #[tokio::test]
    async fn critical_lot_is_capped_for_emergency_sale() {
        let mut request = AssessmentRequest::new("tomato", 35.0, 90.0, "Mumbai");
        request.age_hours = 48.0;
        request.urgency = UrgencyLevel::High;
        let freshness = freshness_for(&request);

        let catalog = CropProfileCatalog::with_defaults();
        let pricer = pricer(Arc::new(FixedSource {
            snapshot: snapshot(50, 90.0, 10.0),
        }));
        let outcome = pricer
            .price(&request, &freshness, &catalog.profile_for("tomato"))
            .await
            .unwrap();

        assert!(outcome.value.multiplier <= 0.50);
        assert_eq!(outcome.value.strategy, PricingStrategy::Clearance);
    }

    /// Bulk consignments over 100 kg take the post-clamp discount
    #[tokio::test]
    async fn bulk_discount_applies_above_100_kg() {
        let catalog = CropProfileCatalog::with_defaults();
        let profile = catalog.profile_for("tomato");
        let source = Arc::new(FixedSource {
            snapshot: snapshot(50, 50.0, 50.0),
        });

        let mut small = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        small.quantity_kg = 100.0;
        let mut bulk = small.clone();
        bulk.quantity_kg = 150.0;

        let freshness = freshness_for(&small);
        let pricer = pricer(source);
        let small_outcome = pricer.price(&small, &freshness, &profile).await.unwrap();
        let bulk_outcome = pricer.price(&bulk, &freshness, &profile).await.unwrap();

        assert!(bulk_outcome.value.multiplier < small_outcome.value.multiplier);
    }

    /// An unreachable source falls back to the last-known price
    #[tokio::test]
    async fn down_source_falls_back_without_failing() {
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let freshness = freshness_for(&request);
        let catalog = CropProfileCatalog::with_defaults();

        let pricer = pricer(Arc::new(DownSource));
        let outcome = pricer
            .price(&request, &freshness, &catalog.profile_for("tomato"))
            .await
            .unwrap();

        assert!(outcome.fallback_used);
        assert_eq!(outcome.value.origin, DataOrigin::Fallback);
        assert_eq!(outcome.value.base_price_per_kg, Decimal::new(40, 0));
        assert!(outcome
            .value
            .recommendations
            .iter()
            .any(|r| r.message.contains("last known reference")));
    }

    /// A corrupt snapshot is an execution error, not a fallback
    #[tokio::test]
    async fn non_positive_snapshot_price_is_an_execution_error() {
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let freshness = freshness_for(&request);
        let catalog = CropProfileCatalog::with_defaults();

        let pricer = pricer(Arc::new(FixedSource {
            snapshot: snapshot(0, 50.0, 50.0),
        }));
        let result = pricer
            .price(&request, &freshness, &catalog.profile_for("tomato"))
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::StageExecution { stage: Stage::Market, .. })
        ));
    }

    /// Final price is base price times multiplier, rounded to paise
    #[tokio::test]
    async fn final_price_follows_multiplier() {
        let mut request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        request.age_hours = 2.0;
        request.quantity_kg = 100.0;
        let freshness = freshness_for(&request);
        let catalog = CropProfileCatalog::with_defaults();

        let pricer = pricer(Arc::new(FixedSource {
            snapshot: snapshot(50, 80.0, 40.0),
        }));
        let outcome = pricer
            .price(&request, &freshness, &catalog.profile_for("tomato"))
            .await
            .unwrap();

        let expected = (Decimal::new(50, 0)
            * Decimal::from_f64_retain(outcome.value.multiplier).unwrap())
        .round_dp(2);
        assert_eq!(outcome.value.final_price_per_kg, expected);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn temperature_strategy() -> impl Strategy<Value = f64> {
        -10.0..=60.0f64
    }

    fn humidity_strategy() -> impl Strategy<Value = f64> {
        0.0..=100.0f64
    }

    fn age_strategy() -> impl Strategy<Value = f64> {
        0.0..=200.0f64
    }

    fn quantity_strategy() -> impl Strategy<Value = f64> {
        1.0..=1000.0f64
    }

    fn urgency_strategy() -> impl Strategy<Value = UrgencyLevel> {
        prop::sample::select(vec![
            UrgencyLevel::Low,
            UrgencyLevel::Medium,
            UrgencyLevel::High,
        ])
    }

    fn index_strategy() -> impl Strategy<Value = f64> {
        0.0..=100.0f64
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The multiplier never leaves [0.50, 1.20] for any combination of
        /// freshness, demand, urgency and quantity
        #[test]
        fn multiplier_is_always_within_absolute_bounds(
            temperature in temperature_strategy(),
            humidity in humidity_strategy(),
            age in age_strategy(),
            quantity in quantity_strategy(),
            urgency in urgency_strategy(),
            demand in index_strategy(),
            supply in index_strategy(),
            price in 1i64..=500i64
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            rt.block_on(async {
                let mut request = AssessmentRequest::new("tomato", temperature, humidity, "Mumbai");
                request.age_hours = age;
                request.quantity_kg = quantity;
                request.urgency = urgency;

                let freshness = freshness_for(&request);
                let catalog = CropProfileCatalog::with_defaults();
                let pricer = pricer(Arc::new(FixedSource {
                    snapshot: snapshot(price, demand, supply),
                }));
                let outcome = pricer
                    .price(&request, &freshness, &catalog.profile_for("tomato"))
                    .await
                    .unwrap();

                prop_assert!((0.50..=1.20).contains(&outcome.value.multiplier));
                if freshness.score < 20.0 {
                    prop_assert!(outcome.value.multiplier <= 0.50);
                    prop_assert_eq!(outcome.value.strategy, PricingStrategy::Clearance);
                }
                Ok(())
            })?;
        }
    }
}
