//! Weather assessment stage
//!
//! Converts the forecast for the target location into a freshness
//! degradation delta and a risk level. An unavailable forecast source is
//! replaced by the seasonal baseline, tagged as simulated.

use std::sync::Arc;

use chrono::Datelike;
use shared::{
    classify_weather_risk, AssessmentRequest, CropProfile, ForecastPoint, ForecastSource,
    Recommendation, Severity, Stage, WeatherResult, WeatherRisk,
};
use tracing::warn;

use crate::config::WeatherStageConfig;
use crate::error::PipelineResult;
use crate::external::{seasonal_baseline, ForecastProvider};
use crate::stages::StageOutcome;

const PRECIPITATION_FACTOR: f64 = 2.0;
const WIND_THRESHOLD_MPS: f64 = 8.0;
const WIND_FACTOR: f64 = 1.5;
const HUMIDITY_DEVIATION_FACTOR: f64 = 0.05;
const HEAVY_RAIN_MM: f64 = 4.0;

/// Weather assessor
#[derive(Clone)]
pub struct WeatherAssessor {
    provider: Arc<dyn ForecastProvider>,
    config: WeatherStageConfig,
}

impl WeatherAssessor {
    /// Create a new WeatherAssessor
    pub fn new(provider: Arc<dyn ForecastProvider>, config: WeatherStageConfig) -> Self {
        Self { provider, config }
    }

    /// Assess weather risk for a consignment's target location
    pub async fn assess(
        &self,
        request: &AssessmentRequest,
        profile: &CropProfile,
    ) -> PipelineResult<StageOutcome<WeatherResult>> {
        let live_points = match self
            .provider
            .forecast(&request.location, self.config.lead_hours)
            .await
        {
            Ok(Some(points)) if !points.is_empty() => Some(points),
            Ok(_) => None,
            Err(err) => {
                warn!(location = %request.location, error = %err,
                    "forecast unavailable, substituting seasonal baseline");
                None
            }
        };

        let (points, source) = match live_points {
            Some(points) => (points, ForecastSource::Live),
            None => {
                let month = self
                    .config
                    .baseline_month
                    .unwrap_or_else(|| chrono::Utc::now().month());
                (
                    seasonal_baseline(&request.location, month, self.config.lead_hours),
                    ForecastSource::Simulated,
                )
            }
        };

        let degradation_delta = degradation_delta(&points, profile);
        let risk = classify_weather_risk(degradation_delta);
        let heavy_rain = mean(&points, |p| p.precipitation_mm) >= HEAVY_RAIN_MM;

        let result = WeatherResult {
            degradation_delta,
            risk,
            source,
            recommendations: build_recommendations(risk, source, heavy_rain),
        };

        Ok(match source {
            ForecastSource::Live => StageOutcome::live(result),
            ForecastSource::Simulated => StageOutcome::fallback(result),
        })
    }
}

/// Degradation delta in percentage points, always >= 0
fn degradation_delta(points: &[ForecastPoint], profile: &CropProfile) -> f64 {
    let precipitation = mean(points, |p| p.precipitation_mm);
    let wind = mean(points, |p| p.wind_speed_mps);
    let humidity = mean(points, |p| p.humidity_pct);
    let humidity_deviation = (humidity - profile.humidity_band_pct.midpoint()).abs();

    let raw = precipitation * PRECIPITATION_FACTOR
        + (wind - WIND_THRESHOLD_MPS).max(0.0) * WIND_FACTOR
        + humidity_deviation * HUMIDITY_DEVIATION_FACTOR;

    (profile.weather_sensitivity * raw).max(0.0)
}

fn mean(points: &[ForecastPoint], f: impl Fn(&ForecastPoint) -> f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(f).sum::<f64>() / points.len() as f64
}

fn build_recommendations(
    risk: WeatherRisk,
    source: ForecastSource,
    heavy_rain: bool,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    match risk {
        WeatherRisk::Critical => recommendations.push(Recommendation::new(
            Severity::Critical,
            Stage::Weather,
            "Severe weather on the route: reschedule or secure protected transport",
        )),
        WeatherRisk::High => recommendations.push(Recommendation::new(
            Severity::High,
            Stage::Weather,
            "High weather risk: expedite dispatch ahead of the front",
        )),
        _ => {}
    }

    if heavy_rain && risk != WeatherRisk::Critical {
        recommendations.push(Recommendation::new(
            Severity::Medium,
            Stage::Weather,
            "Rain expected on the route; use covered vehicles",
        ));
    }

    if source == ForecastSource::Simulated {
        recommendations.push(Recommendation::new(
            Severity::Low,
            Stage::Weather,
            "Forecast service unavailable; assessment uses the seasonal baseline",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ValueBand;

    fn profile_with_sensitivity(weather_sensitivity: f64) -> CropProfile {
        CropProfile {
            weather_sensitivity,
            humidity_band_pct: ValueBand::new(55.0, 75.0),
            ..CropProfile::generic()
        }
    }

    fn point(precipitation_mm: f64, wind_speed_mps: f64, humidity_pct: f64) -> ForecastPoint {
        ForecastPoint {
            lead_hours: 6,
            temperature_c: 28.0,
            humidity_pct,
            precipitation_mm,
            wind_speed_mps,
            condition: "Clouds".to_string(),
        }
    }

    #[test]
    fn clear_weather_yields_low_delta() {
        let points = vec![point(0.0, 3.0, 60.0)];
        let delta = degradation_delta(&points, &profile_with_sensitivity(1.2));
        assert!(delta < 5.0);
    }

    #[test]
    fn monsoon_weather_raises_delta() {
        let points = vec![point(8.0, 12.0, 95.0)];
        let delta = degradation_delta(&points, &profile_with_sensitivity(1.2));
        assert!(delta >= 15.0);
    }

    #[test]
    fn delta_is_never_negative() {
        let points = vec![point(0.0, 0.0, 65.0)];
        let delta = degradation_delta(&points, &profile_with_sensitivity(0.0));
        assert!(delta >= 0.0);
    }
}
