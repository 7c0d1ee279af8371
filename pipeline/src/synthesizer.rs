//! Synthesizer
//!
//! Merges the four stage results into the final assessment. Never fails:
//! a stage that produced nothing is substituted with a documented neutral
//! default and recorded as such in the audit.

use std::collections::HashSet;

use rust_decimal::Decimal;
use shared::{
    AssessmentRequest, AssessmentStatus, DataOrigin, DeliveryMode, FinalAssessment, ForecastSource,
    FreshnessResult, LogisticsResult, MarketResult, PriceTrend, PricingStrategy, Recommendation,
    Severity, Stage, StageAudit, StageDisposition, StageDispositions, WeatherResult, WeatherRisk,
};

use crate::config::{ConfidenceConfig, MarketStageConfig};
use crate::stages::{logistics::mode_for_score, StageOutcome};

/// Synthesizer for completed or degraded runs
#[derive(Debug, Clone)]
pub struct Synthesizer {
    confidence: ConfidenceConfig,
    market: MarketStageConfig,
}

impl Synthesizer {
    /// Create a new Synthesizer
    pub fn new(confidence: ConfidenceConfig, market: MarketStageConfig) -> Self {
        Self { confidence, market }
    }

    /// Compose the final assessment from whatever the stages produced
    pub fn synthesize(
        &self,
        request: &AssessmentRequest,
        freshness: StageOutcome<FreshnessResult>,
        market: Option<StageOutcome<MarketResult>>,
        logistics: Option<StageOutcome<LogisticsResult>>,
        weather: Option<StageOutcome<WeatherResult>>,
        deadline_hit: bool,
    ) -> FinalAssessment {
        let freshness_disposition = disposition(Some(&freshness));
        let market_disposition = disposition(market.as_ref());
        let logistics_disposition = disposition(logistics.as_ref());
        let weather_disposition = disposition(weather.as_ref());

        let freshness = freshness.value;
        let market = market
            .map(|o| o.value)
            .unwrap_or_else(|| self.neutral_market());
        let logistics = logistics
            .map(|o| o.value)
            .unwrap_or_else(|| neutral_logistics(&freshness));
        let weather = weather.map(|o| o.value).unwrap_or_else(neutral_weather);

        let dispositions = StageDispositions {
            freshness: freshness_disposition,
            market: market_disposition,
            logistics: logistics_disposition,
            weather: weather_disposition,
        };

        let adjusted_score = (freshness.score - weather.degradation_delta).max(0.0);
        let confidence = self.confidence_for(&dispositions);
        let recommendations = merge_recommendations(&freshness, &market, &logistics, &weather);

        let status = if dispositions.all_live() && !deadline_hit {
            AssessmentStatus::Completed
        } else {
            AssessmentStatus::Degraded
        };

        FinalAssessment {
            crop: request.crop.clone(),
            location: request.location.clone(),
            adjusted_score,
            confidence,
            status,
            deadline_hit,
            recommendations,
            audit: StageAudit {
                freshness,
                market,
                logistics,
                weather,
                dispositions,
            },
        }
    }

    fn confidence_for(&self, dispositions: &StageDispositions) -> f64 {
        [
            dispositions.freshness,
            dispositions.market,
            dispositions.logistics,
            dispositions.weather,
        ]
        .iter()
        .map(|d| match d {
            StageDisposition::Live => 1.0,
            StageDisposition::Fallback => self.confidence.fallback_weight,
            StageDisposition::Defaulted => self.confidence.default_weight,
        })
        .product::<f64>()
        .clamp(0.0, 1.0)
    }

    /// Neutral market default used when the market stage produced nothing
    fn neutral_market(&self) -> MarketResult {
        let base = Decimal::from_f64_retain(self.market.fallback_price_per_kg)
            .unwrap_or(Decimal::new(30, 0));
        MarketResult {
            base_price_per_kg: base,
            multiplier: 1.0,
            final_price_per_kg: base,
            strategy: PricingStrategy::MarketRate,
            trend: PriceTrend::Stable,
            origin: DataOrigin::Fallback,
            recommendations: vec![Recommendation::new(
                Severity::Medium,
                Stage::Market,
                "Market stage unavailable; neutral market-rate pricing assumed",
            )],
        }
    }
}

fn disposition<T>(outcome: Option<&StageOutcome<T>>) -> StageDisposition {
    match outcome {
        Some(o) if o.fallback_used => StageDisposition::Fallback,
        Some(_) => StageDisposition::Live,
        None => StageDisposition::Defaulted,
    }
}

/// Neutral logistics default: the mode the freshness score mandates, no
/// driver ranking
fn neutral_logistics(freshness: &FreshnessResult) -> LogisticsResult {
    let mode = mode_for_score(freshness.score);
    LogisticsResult {
        mode,
        cost_multiplier: mode.cost_multiplier(),
        ranked_drivers: Vec::new(),
        insufficient_supply: true,
        recommendations: vec![Recommendation::new(
            Severity::Medium,
            Stage::Logistics,
            "Logistics stage unavailable; no driver ranking produced",
        )],
    }
}

/// Neutral weather default: no degradation applied
fn neutral_weather() -> WeatherResult {
    WeatherResult {
        degradation_delta: 0.0,
        risk: WeatherRisk::Low,
        source: ForecastSource::Simulated,
        recommendations: vec![Recommendation::new(
            Severity::Low,
            Stage::Weather,
            "Weather stage unavailable; no degradation applied",
        )],
    }
}

/// Merge, deduplicate and order the stage recommendations
fn merge_recommendations(
    freshness: &FreshnessResult,
    market: &MarketResult,
    logistics: &LogisticsResult,
    weather: &WeatherResult,
) -> Vec<Recommendation> {
    let urgent_conditions = matches!(weather.risk, WeatherRisk::High | WeatherRisk::Critical)
        || logistics.mode == DeliveryMode::ColdChain;

    let source_priority = |stage: Stage| -> u8 {
        if urgent_conditions {
            match stage {
                Stage::Weather => 0,
                Stage::Logistics => 1,
                Stage::Freshness => 2,
                Stage::Market => 3,
            }
        } else {
            match stage {
                Stage::Freshness => 0,
                Stage::Market => 1,
                Stage::Logistics => 2,
                Stage::Weather => 3,
            }
        }
    };

    let mut merged: Vec<Recommendation> = freshness
        .recommendations
        .iter()
        .chain(market.recommendations.iter())
        .chain(logistics.recommendations.iter())
        .chain(weather.recommendations.iter())
        .cloned()
        .collect();

    merged.sort_by_key(|r| (std::cmp::Reverse(r.severity.rank()), source_priority(r.source)));

    let mut seen = HashSet::new();
    merged.retain(|r| seen.insert(r.message.to_lowercase()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use shared::FreshnessFactors;

    fn synthesizer() -> Synthesizer {
        let config = PipelineConfig::default();
        Synthesizer::new(config.confidence, config.market)
    }

    fn freshness(score: f64) -> FreshnessResult {
        FreshnessResult {
            score,
            level: shared::classify_freshness(score),
            factors: FreshnessFactors {
                temperature: score,
                humidity: score,
                age: score,
            },
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn adjusted_score_floors_at_zero() {
        let synth = synthesizer();
        let weather = WeatherResult {
            degradation_delta: 50.0,
            risk: WeatherRisk::Critical,
            source: ForecastSource::Live,
            recommendations: Vec::new(),
        };
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let assessment = synth.synthesize(
            &request,
            StageOutcome::live(freshness(30.0)),
            None,
            None,
            Some(StageOutcome::live(weather)),
            false,
        );
        assert_eq!(assessment.adjusted_score, 0.0);
    }

    #[test]
    fn missing_stages_degrade_and_lower_confidence() {
        let synth = synthesizer();
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let assessment = synth.synthesize(
            &request,
            StageOutcome::live(freshness(85.0)),
            None,
            None,
            None,
            false,
        );
        assert_eq!(assessment.status, AssessmentStatus::Degraded);
        // three defaulted stages at 0.5 each
        assert!((assessment.confidence - 0.125).abs() < 1e-9);
        assert_eq!(
            assessment.audit.dispositions.market,
            StageDisposition::Defaulted
        );
        assert!(assessment.audit.logistics.insufficient_supply);
    }

    #[test]
    fn all_live_within_budget_is_completed() {
        let synth = synthesizer();
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let market = MarketResult {
            base_price_per_kg: Decimal::new(40, 0),
            multiplier: 1.0,
            final_price_per_kg: Decimal::new(40, 0),
            strategy: PricingStrategy::MarketRate,
            trend: PriceTrend::Stable,
            origin: DataOrigin::Live,
            recommendations: Vec::new(),
        };
        let logistics = LogisticsResult {
            mode: DeliveryMode::Standard,
            cost_multiplier: 1.0,
            ranked_drivers: Vec::new(),
            insufficient_supply: false,
            recommendations: Vec::new(),
        };
        let weather = WeatherResult {
            degradation_delta: 1.0,
            risk: WeatherRisk::Low,
            source: ForecastSource::Live,
            recommendations: Vec::new(),
        };
        let assessment = synth.synthesize(
            &request,
            StageOutcome::live(freshness(85.0)),
            Some(StageOutcome::live(market)),
            Some(StageOutcome::live(logistics)),
            Some(StageOutcome::live(weather)),
            false,
        );
        assert_eq!(assessment.status, AssessmentStatus::Completed);
        assert_eq!(assessment.confidence, 1.0);
        assert_eq!(assessment.adjusted_score, 84.0);
    }

    #[test]
    fn critical_weather_recommendations_surface_first() {
        let synth = synthesizer();
        let request = AssessmentRequest::new("tomato", 22.0, 65.0, "Mumbai");
        let mut fresh = freshness(85.0);
        fresh.recommendations.push(Recommendation::new(
            Severity::Critical,
            Stage::Freshness,
            "Immediate action required: sell or process this lot today",
        ));
        let weather = WeatherResult {
            degradation_delta: 35.0,
            risk: WeatherRisk::Critical,
            source: ForecastSource::Live,
            recommendations: vec![Recommendation::new(
                Severity::Critical,
                Stage::Weather,
                "Severe weather on the route: reschedule or secure protected transport",
            )],
        };
        let assessment = synth.synthesize(
            &request,
            StageOutcome::live(fresh),
            None,
            None,
            Some(StageOutcome::live(weather)),
            false,
        );
        let first = &assessment.recommendations[0];
        assert_eq!(first.source, Stage::Weather);
        assert_eq!(first.severity, Severity::Critical);
    }
}
