//! Driver registry clients
//!
//! A thin HTTP registry client plus a simulated static fleet for demos
//! and tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{DeliveryMode, DriverCandidate, DriverStatus, Stage, VehicleType};

use crate::error::{PipelineError, PipelineResult};
use crate::external::DriverRegistry;

/// Driver registry API client
#[derive(Clone)]
pub struct DriverApiClient {
    client: Client,
    base_url: String,
}

/// API response for a registry query
#[derive(Debug, Deserialize)]
struct RegistryResponse {
    drivers: Vec<DriverCandidate>,
}

impl DriverApiClient {
    /// Create a new DriverApiClient
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn unavailable(reason: String) -> PipelineError {
        PipelineError::StageUnavailable {
            stage: Stage::Logistics,
            reason,
        }
    }
}

#[async_trait]
impl DriverRegistry for DriverApiClient {
    async fn query(
        &self,
        location: &str,
        min_capacity_kg: f64,
        mode: DeliveryMode,
    ) -> PipelineResult<Vec<DriverCandidate>> {
        let mode_tag = match mode {
            DeliveryMode::ColdChain => "cold_chain",
            DeliveryMode::Refrigerated => "refrigerated",
            DeliveryMode::Standard => "standard",
        };
        let url = format!(
            "{}/drivers?location={}&min_capacity={}&mode={}",
            self.base_url, location, min_capacity_kg, mode_tag
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("driver registry request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::unavailable(format!("driver registry error: {}", status)));
        }

        let data: RegistryResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("failed to parse registry response: {}", e)))?;

        Ok(data.drivers)
    }
}

/// Simulated registry backed by a fixed fleet
#[derive(Debug, Clone)]
pub struct SimulatedDriverRegistry {
    fleet: Vec<DriverCandidate>,
}

impl SimulatedDriverRegistry {
    /// Registry over an explicit fleet
    pub fn new(fleet: Vec<DriverCandidate>) -> Self {
        Self { fleet }
    }

    /// Registry over the built-in demo fleet
    pub fn with_default_fleet() -> Self {
        Self::new(default_fleet())
    }
}

#[async_trait]
impl DriverRegistry for SimulatedDriverRegistry {
    async fn query(
        &self,
        _location: &str,
        min_capacity_kg: f64,
        _mode: DeliveryMode,
    ) -> PipelineResult<Vec<DriverCandidate>> {
        // The simulated registry pre-filters on capacity only; binding
        // eligibility rules stay with the logistics stage.
        Ok(self
            .fleet
            .iter()
            .filter(|d| d.capacity_kg >= min_capacity_kg)
            .cloned()
            .collect())
    }
}

fn driver(
    id: &str,
    name: &str,
    capacity_kg: f64,
    rating: f64,
    vehicle: VehicleType,
    status: DriverStatus,
    distance_km: f64,
    location: &str,
) -> DriverCandidate {
    DriverCandidate {
        id: id.to_string(),
        name: name.to_string(),
        capacity_kg,
        rating,
        vehicle,
        status,
        distance_km,
        location: location.to_string(),
    }
}

/// Built-in demo fleet
fn default_fleet() -> Vec<DriverCandidate> {
    vec![
        driver("DRV-001", "Ravi Kumar", 500.0, 4.8, VehicleType::Refrigerated, DriverStatus::Available, 12.0, "Mumbai"),
        driver("DRV-002", "Sunil Yadav", 1200.0, 4.2, VehicleType::Refrigerated, DriverStatus::Available, 45.0, "Thane"),
        driver("DRV-003", "Amit Singh", 300.0, 3.6, VehicleType::Insulated, DriverStatus::Available, 8.0, "Mumbai"),
        driver("DRV-004", "Prakash Rao", 800.0, 2.4, VehicleType::Open, DriverStatus::Available, 30.0, "Navi Mumbai"),
        driver("DRV-005", "Mohan Das", 2000.0, 4.9, VehicleType::Refrigerated, DriverStatus::OnTrip, 22.0, "Mumbai"),
        driver("DRV-006", "Kiran Patil", 150.0, 4.5, VehicleType::Open, DriverStatus::Available, 600.0, "Nagpur"),
        driver("DRV-007", "Suresh Nair", 400.0, 3.9, VehicleType::Open, DriverStatus::Available, 25.0, "Mumbai"),
        driver("DRV-008", "Vijay Sharma", 1000.0, 3.1, VehicleType::Insulated, DriverStatus::Available, 120.0, "Pune"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_registry_filters_on_capacity() {
        let registry = SimulatedDriverRegistry::with_default_fleet();
        let drivers = registry
            .query("Mumbai", 900.0, DeliveryMode::Standard)
            .await
            .unwrap();
        assert!(drivers.iter().all(|d| d.capacity_kg >= 900.0));
        assert!(!drivers.is_empty());
    }
}
