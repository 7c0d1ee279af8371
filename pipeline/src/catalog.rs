//! Crop profile catalog
//!
//! Static table of per-crop physical parameters, built once at process
//! start and read-only afterwards. Lookups are case-insensitive; unknown
//! crops resolve to the generic default profile.

use std::collections::HashMap;

use shared::{CropProfile, ValueBand};

/// Read-only catalog of crop profiles
#[derive(Debug, Clone)]
pub struct CropProfileCatalog {
    profiles: HashMap<String, CropProfile>,
    default_profile: CropProfile,
}

impl CropProfileCatalog {
    /// Build the catalog from the built-in profile table
    pub fn with_defaults() -> Self {
        Self::from_profiles(default_profiles())
    }

    /// Build the catalog from an explicit profile list
    pub fn from_profiles(profiles: Vec<CropProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.crop.to_lowercase(), p))
            .collect();
        Self {
            profiles,
            default_profile: CropProfile::generic(),
        }
    }

    /// Look up the profile for a crop, falling back to the generic default
    pub fn profile_for(&self, crop: &str) -> CropProfile {
        self.profiles
            .get(crop.trim().to_lowercase().as_str())
            .cloned()
            .unwrap_or_else(|| self.default_profile.clone())
    }

    /// Whether the catalog has a dedicated profile for this crop
    pub fn contains(&self, crop: &str) -> bool {
        self.profiles.contains_key(crop.trim().to_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn profile(
    crop: &str,
    temperature_band_c: (f64, f64),
    humidity_band_pct: (f64, f64),
    temperature_spread_c: f64,
    humidity_spread_pct: f64,
    degradation_rate_per_hour: f64,
    price_sensitivity: f64,
    weather_sensitivity: f64,
) -> CropProfile {
    CropProfile {
        crop: crop.to_string(),
        temperature_band_c: ValueBand::new(temperature_band_c.0, temperature_band_c.1),
        humidity_band_pct: ValueBand::new(humidity_band_pct.0, humidity_band_pct.1),
        temperature_spread_c,
        humidity_spread_pct,
        degradation_rate_per_hour,
        price_sensitivity,
        weather_sensitivity,
    }
}

/// Built-in profile table for the commonly assessed crops
fn default_profiles() -> Vec<CropProfile> {
    vec![
        profile("tomato", (18.0, 25.0), (55.0, 75.0), 10.0, 20.0, 5.0, 1.2, 1.2),
        profile("potato", (8.0, 16.0), (85.0, 95.0), 12.0, 25.0, 0.5, 0.8, 0.6),
        profile("onion", (20.0, 30.0), (55.0, 70.0), 12.0, 25.0, 0.4, 0.9, 0.7),
        profile("spinach", (2.0, 10.0), (85.0, 95.0), 8.0, 20.0, 8.0, 1.4, 1.5),
        profile("mango", (10.0, 18.0), (80.0, 90.0), 10.0, 20.0, 2.0, 1.5, 1.1),
        profile("banana", (13.0, 18.0), (85.0, 95.0), 8.0, 20.0, 2.5, 1.1, 1.0),
        profile("okra", (7.0, 10.0), (90.0, 95.0), 8.0, 20.0, 4.0, 1.0, 1.2),
        profile("cabbage", (0.0, 5.0), (90.0, 98.0), 10.0, 25.0, 1.0, 0.7, 0.8),
    ]
}
