//! External collaborator contracts and reference implementations
//!
//! The pipeline core only depends on the traits below. Live HTTP clients
//! and deterministic simulated providers ship alongside them for the demo
//! binary and tests.

pub mod drivers;
pub mod forecast;
pub mod market;

use async_trait::async_trait;
use shared::{DeliveryMode, DriverCandidate, ForecastPoint, MarketSnapshot};

use crate::error::PipelineResult;

pub use drivers::{DriverApiClient, SimulatedDriverRegistry};
pub use forecast::{seasonal_baseline, ForecastApiClient, SimulatedForecastProvider};
pub use market::{MarketApiClient, SimulatedMarketSource};

/// Market snapshot lookup
///
/// `Ok(None)` means the source has no data for this crop/location; `Err`
/// means the source could not be reached. Both are handled by the market
/// stage as fallback triggers, never as stage failures.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn snapshot(&self, crop: &str, location: &str) -> PipelineResult<Option<MarketSnapshot>>;
}

/// Driver registry query
///
/// Returns candidates registered near the location, pre-filtered by the
/// registry to roughly the requested capacity and mode; the logistics
/// stage applies the binding eligibility rules itself.
#[async_trait]
pub trait DriverRegistry: Send + Sync {
    async fn query(
        &self,
        location: &str,
        min_capacity_kg: f64,
        mode: DeliveryMode,
    ) -> PipelineResult<Vec<DriverCandidate>>;
}

/// Forecast lookup for a location and lead window
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(
        &self,
        location: &str,
        lead_hours: u32,
    ) -> PipelineResult<Option<Vec<ForecastPoint>>>;
}
