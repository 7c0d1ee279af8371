//! Configuration management for the crop assessment pipeline
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CAP_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Current environment (development, production)
    pub environment: String,

    /// Run budgets and retry policy
    pub run: RunConfig,

    /// Confidence weights applied by the synthesizer
    pub confidence: ConfidenceConfig,

    /// Market stage configuration
    pub market: MarketStageConfig,

    /// Logistics stage configuration
    pub logistics: LogisticsStageConfig,

    /// Weather stage configuration
    pub weather: WeatherStageConfig,

    /// Endpoints for live collaborator clients
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Overall deadline for one assessment run, in milliseconds
    pub overall_deadline_ms: u64,

    /// Cap on a single stage attempt, in milliseconds
    pub stage_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfidenceConfig {
    /// Weight for a stage that used fallback data
    pub fallback_weight: f64,

    /// Weight for a stage replaced by a neutral default
    pub default_weight: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketStageConfig {
    /// Static price per kg used when no market data exists for a crop
    pub fallback_price_per_kg: f64,

    /// Unit price above which a consignment counts as premium (₹/kg)
    pub premium_price_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogisticsStageConfig {
    /// Candidates registered farther than this are excluded, in km
    pub max_distance_km: f64,

    /// Required capacity headroom over the consignment quantity
    pub capacity_buffer: f64,

    /// Minimum driver rating accepted on premium deliveries
    pub min_premium_rating: f64,

    /// Ranking shorter than this sets the insufficient-supply flag
    pub min_candidates: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherStageConfig {
    /// Forecast window requested from the collaborator, in hours
    pub lead_hours: u32,

    /// Pin the seasonal-baseline month; current month when unset
    pub baseline_month: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    /// Market data API endpoint; simulated source when unset
    pub market_api_url: Option<String>,
    pub market_api_key: Option<String>,

    /// Forecast API endpoint; simulated provider when unset
    pub forecast_api_url: Option<String>,
    pub forecast_api_key: Option<String>,

    /// Driver registry API endpoint; simulated fleet when unset
    pub drivers_api_url: Option<String>,
}

impl PipelineConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CAP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("run.overall_deadline_ms", 800)?
            .set_default("run.stage_timeout_ms", 300)?
            .set_default("confidence.fallback_weight", 0.7)?
            .set_default("confidence.default_weight", 0.5)?
            .set_default("market.fallback_price_per_kg", 35.0)?
            .set_default("market.premium_price_threshold", 100.0)?
            .set_default("logistics.max_distance_km", 500.0)?
            .set_default("logistics.capacity_buffer", 1.10)?
            .set_default("logistics.min_premium_rating", 3.0)?
            .set_default("logistics.min_candidates", 3)?
            .set_default("weather.lead_hours", 24)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CAP_ prefix)
            .add_source(
                Environment::with_prefix("CAP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            run: RunConfig {
                overall_deadline_ms: 800,
                stage_timeout_ms: 300,
            },
            confidence: ConfidenceConfig {
                fallback_weight: 0.7,
                default_weight: 0.5,
            },
            market: MarketStageConfig {
                fallback_price_per_kg: 35.0,
                premium_price_threshold: 100.0,
            },
            logistics: LogisticsStageConfig {
                max_distance_km: 500.0,
                capacity_buffer: 1.10,
                min_premium_rating: 3.0,
                min_candidates: 3,
            },
            weather: WeatherStageConfig {
                lead_hours: 24,
                baseline_month: None,
            },
            sources: SourcesConfig::default(),
        }
    }
}
