//! Market data clients
//!
//! A thin HTTP client for a mandi price API plus a deterministic simulated
//! source for demos and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{MarketSnapshot, Stage};

use crate::error::{PipelineError, PipelineResult};
use crate::external::MarketDataSource;

/// Market price API client
#[derive(Clone)]
pub struct MarketApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// API response for a market snapshot
#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    price_per_kg: f64,
    demand_index: f64,
    supply_index: f64,
    recorded_at: DateTime<Utc>,
}

impl MarketApiClient {
    /// Create a new MarketApiClient
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    fn unavailable(reason: String) -> PipelineError {
        PipelineError::StageUnavailable {
            stage: Stage::Market,
            reason,
        }
    }
}

#[async_trait]
impl MarketDataSource for MarketApiClient {
    async fn snapshot(&self, crop: &str, location: &str) -> PipelineResult<Option<MarketSnapshot>> {
        let url = format!(
            "{}/snapshot?crop={}&location={}&key={}",
            self.base_url, crop, location, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("market API request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::unavailable(format!("market API error: {}", status)));
        }

        let data: SnapshotResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("failed to parse market response: {}", e)))?;

        Ok(Some(MarketSnapshot {
            price_per_kg: Decimal::from_f64_retain(data.price_per_kg).unwrap_or_default(),
            demand_index: data.demand_index,
            supply_index: data.supply_index,
            recorded_at: data.recorded_at,
        }))
    }
}

/// Deterministic in-process market source
///
/// Prices come from a static reference table; demand and supply indices
/// are derived from a stable hash of crop and location, so identical
/// queries always return identical snapshots.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMarketSource {
    overrides: Vec<(String, Decimal)>,
}

impl SimulatedMarketSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the reference price for one crop
    pub fn with_price(mut self, crop: &str, price_per_kg: Decimal) -> Self {
        self.overrides.push((crop.to_lowercase(), price_per_kg));
        self
    }

    fn reference_price(&self, crop: &str) -> Decimal {
        let crop = crop.to_lowercase();
        if let Some((_, price)) = self.overrides.iter().find(|(c, _)| *c == crop) {
            return *price;
        }
        reference_price_table(&crop).unwrap_or_else(|| Decimal::new(30, 0))
    }
}

#[async_trait]
impl MarketDataSource for SimulatedMarketSource {
    async fn snapshot(&self, crop: &str, location: &str) -> PipelineResult<Option<MarketSnapshot>> {
        let seed = stable_hash(&format!("{}:{}", crop.to_lowercase(), location.to_lowercase()));
        let demand_index = 30.0 + (seed % 70) as f64;
        let supply_index = 30.0 + ((seed >> 8) % 70) as f64;

        Ok(Some(MarketSnapshot {
            price_per_kg: self.reference_price(crop),
            demand_index,
            supply_index,
            recorded_at: DateTime::<Utc>::UNIX_EPOCH,
        }))
    }
}

/// Static wholesale reference prices in ₹/kg
fn reference_price_table(crop: &str) -> Option<Decimal> {
    let price = match crop {
        "tomato" => Decimal::new(40, 0),
        "potato" => Decimal::new(22, 0),
        "onion" => Decimal::new(28, 0),
        "spinach" => Decimal::new(50, 0),
        "mango" => Decimal::new(120, 0),
        "banana" => Decimal::new(35, 0),
        "okra" => Decimal::new(45, 0),
        "cabbage" => Decimal::new(18, 0),
        _ => return None,
    };
    Some(price)
}

/// FNV-1a hash, stable across processes
pub(crate) fn stable_hash(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
