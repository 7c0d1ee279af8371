//! Freshness scoring stage
//!
//! Pure and deterministic: environmental readings in, score and level out.
//! No I/O, no suspension; a validated request cannot make it fail.

use shared::{
    classify_freshness, AssessmentRequest, CropProfile, FreshnessFactors, FreshnessLevel,
    FreshnessResult, Recommendation, Severity, Stage, ValueBand,
};

const TEMPERATURE_WEIGHT: f64 = 0.30;
const HUMIDITY_WEIGHT: f64 = 0.40;
const AGE_WEIGHT: f64 = 0.30;

/// Freshness scorer
#[derive(Debug, Clone, Default)]
pub struct FreshnessScorer;

impl FreshnessScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a request against its crop profile
    pub fn score(&self, request: &AssessmentRequest, profile: &CropProfile) -> FreshnessResult {
        let temperature = band_score(
            request.temperature_c,
            &profile.temperature_band_c,
            profile.temperature_spread_c,
        );
        let humidity = band_score(
            request.humidity_pct,
            &profile.humidity_band_pct,
            profile.humidity_spread_pct,
        );
        let age = (100.0 - request.age_hours * profile.degradation_rate_per_hour).max(0.0);

        let score = TEMPERATURE_WEIGHT * temperature + HUMIDITY_WEIGHT * humidity + AGE_WEIGHT * age;
        let level = classify_freshness(score);
        let factors = FreshnessFactors {
            temperature,
            humidity,
            age,
        };
        let recommendations = build_recommendations(level, &factors);

        FreshnessResult {
            score,
            level,
            factors,
            recommendations,
        }
    }
}

/// Sub-score for a reading against its optimal band
///
/// 100 inside the band; outside, the penalty grows with the distance from
/// the nearest edge and saturates to 0 at the crop-specific spread.
fn band_score(value: f64, band: &ValueBand, spread: f64) -> f64 {
    if band.contains(value) {
        return 100.0;
    }
    let distance = band.distance_from(value);
    if spread <= 0.0 {
        return 0.0;
    }
    (100.0 * (1.0 - (distance / spread).min(1.0))).max(0.0)
}

fn build_recommendations(level: FreshnessLevel, factors: &FreshnessFactors) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if level == FreshnessLevel::Critical {
        recommendations.push(Recommendation::new(
            Severity::Critical,
            Stage::Freshness,
            "Immediate action required: sell or process this lot today",
        ));
    }

    if matches!(level, FreshnessLevel::Poor | FreshnessLevel::Critical) {
        recommendations.push(Recommendation::new(
            Severity::High,
            Stage::Freshness,
            "Use cold-chain transport to stop further degradation",
        ));
    }

    if factors.temperature < 50.0 {
        recommendations.push(Recommendation::new(
            Severity::Medium,
            Stage::Freshness,
            "Move the produce to temperature-controlled storage",
        ));
    }

    if factors.humidity < 50.0 {
        recommendations.push(Recommendation::new(
            Severity::Medium,
            Stage::Freshness,
            "Adjust storage humidity toward the crop's optimal band",
        ));
    }

    if factors.age < 40.0 {
        recommendations.push(Recommendation::new(
            Severity::Medium,
            Stage::Freshness,
            "Prioritize dispatch; lot age is eroding shelf life",
        ));
    }

    if level == FreshnessLevel::Excellent {
        recommendations.push(Recommendation::new(
            Severity::Low,
            Stage::Freshness,
            "Quality supports premium positioning",
        ));
    }

    recommendations
}
