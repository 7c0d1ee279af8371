//! Assessment request model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::UrgencyLevel;

fn default_quantity_kg() -> f64 {
    10.0
}

/// A single measurement submitted for assessment
///
/// Temperature and humidity bounds are hard invariants: a request outside
/// them is rejected before any stage runs.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AssessmentRequest {
    /// Crop identifier, matched case-insensitively against the catalog
    #[validate(length(min = 1, message = "crop is required"))]
    pub crop: String,

    /// Ambient temperature reading in °C; bounds enforced by
    /// `validation::validate_temperature_c`
    pub temperature_c: f64,

    /// Relative humidity reading in %
    #[validate(range(min = 0.0, max = 100.0, message = "humidity must be between 0 and 100%"))]
    pub humidity_pct: f64,

    /// Hours since harvest
    #[serde(default)]
    pub age_hours: f64,

    /// Consignment size in kilograms
    #[serde(default = "default_quantity_kg")]
    pub quantity_kg: f64,

    /// Target delivery location
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,

    /// Delivery urgency
    #[serde(default)]
    pub urgency: UrgencyLevel,
}

impl AssessmentRequest {
    /// Convenience constructor with the documented defaults for age,
    /// quantity and urgency
    pub fn new(crop: impl Into<String>, temperature_c: f64, humidity_pct: f64, location: impl Into<String>) -> Self {
        Self {
            crop: crop.into(),
            temperature_c,
            humidity_pct,
            age_hours: 0.0,
            quantity_kg: default_quantity_kg(),
            location: location.into(),
            urgency: UrgencyLevel::default(),
        }
    }
}
