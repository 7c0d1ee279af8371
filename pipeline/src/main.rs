//! Crop assessment pipeline - demo entry point
//!
//! Reads one assessment request as JSON (first argument or stdin), runs it
//! through the pipeline against the configured or simulated collaborators,
//! and prints the decision bundle as JSON.

use std::io::Read;
use std::sync::Arc;

use shared::AssessmentRequest;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crop_assessment_pipeline::external::{
    DriverApiClient, DriverRegistry, ForecastApiClient, ForecastProvider, MarketApiClient,
    MarketDataSource, SimulatedDriverRegistry, SimulatedForecastProvider, SimulatedMarketSource,
};
use crop_assessment_pipeline::{CropProfileCatalog, Orchestrator, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_assess=debug,crop_assessment_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = PipelineConfig::load()?;

    tracing::info!("Starting crop assessment pipeline");
    tracing::info!("Environment: {}", config.environment);

    let market_source: Arc<dyn MarketDataSource> = match (&config.sources.market_api_url, &config.sources.market_api_key) {
        (Some(url), Some(key)) => Arc::new(MarketApiClient::new(key.clone(), url.clone())),
        _ => {
            tracing::info!("No market API configured, using the simulated source");
            Arc::new(SimulatedMarketSource::new())
        }
    };

    let forecast_provider: Arc<dyn ForecastProvider> = match (&config.sources.forecast_api_url, &config.sources.forecast_api_key) {
        (Some(url), Some(key)) => Arc::new(ForecastApiClient::new(key.clone(), url.clone())),
        _ => {
            tracing::info!("No forecast API configured, using the simulated provider");
            Arc::new(SimulatedForecastProvider::new())
        }
    };

    let driver_registry: Arc<dyn DriverRegistry> = match &config.sources.drivers_api_url {
        Some(url) => Arc::new(DriverApiClient::new(url.clone())),
        None => {
            tracing::info!("No driver registry configured, using the simulated fleet");
            Arc::new(SimulatedDriverRegistry::with_default_fleet())
        }
    };

    let catalog = CropProfileCatalog::with_defaults();
    tracing::info!("Crop profile catalog loaded with {} profiles", catalog.len());

    let orchestrator = Orchestrator::new(
        catalog,
        market_source,
        driver_registry,
        forecast_provider,
        config,
    );

    let request = read_request()?;

    match orchestrator.assess(request).await {
        Ok(assessment) => {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.to_response())?);
            std::process::exit(1);
        }
    }
}

/// Read the request JSON from the first argument, or stdin when absent
fn read_request() -> anyhow::Result<AssessmentRequest> {
    let raw = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let request = serde_json::from_str(&raw)?;
    Ok(request)
}
