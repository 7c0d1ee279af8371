//! Validation utilities for assessment requests
//!
//! Range invariants live on the `Validate` derive of [`AssessmentRequest`];
//! the checks the derive cannot express are enforced here. A request that
//! fails any check is rejected before any stage runs.

use thiserror::Error;
use validator::Validate;

use crate::models::AssessmentRequest;

/// A rejected request, identifying the offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct RequestValidationError {
    pub field: String,
    pub message: String,
}

/// Validate a request against all invariants
pub fn validate_request(request: &AssessmentRequest) -> Result<(), RequestValidationError> {
    if let Err(errors) = request.validate() {
        if let Some((field, field_errors)) = errors.field_errors().into_iter().next() {
            let message = field_errors
                .first()
                .and_then(|e| e.message.clone())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("invalid value for {}", field));
            return Err(RequestValidationError {
                field: field.to_string(),
                message,
            });
        }
    }

    if request.crop.trim().is_empty() {
        return Err(RequestValidationError {
            field: "crop".to_string(),
            message: "crop is required".to_string(),
        });
    }

    if request.location.trim().is_empty() {
        return Err(RequestValidationError {
            field: "location".to_string(),
            message: "location is required".to_string(),
        });
    }

    validate_temperature_c(request.temperature_c).map_err(|message| RequestValidationError {
        field: "temperature_c".to_string(),
        message: message.to_string(),
    })?;

    validate_age_hours(request.age_hours).map_err(|message| RequestValidationError {
        field: "age_hours".to_string(),
        message: message.to_string(),
    })?;

    validate_quantity_kg(request.quantity_kg).map_err(|message| RequestValidationError {
        field: "quantity_kg".to_string(),
        message: message.to_string(),
    })?;

    Ok(())
}

/// Validate a temperature reading is within the sensor invariant
pub fn validate_temperature_c(temperature_c: f64) -> Result<(), &'static str> {
    if !temperature_c.is_finite() || !(-10.0..=60.0).contains(&temperature_c) {
        return Err("temperature must be between -10 and 60 °C");
    }
    Ok(())
}

/// Validate lot age is a non-negative finite number of hours
pub fn validate_age_hours(age_hours: f64) -> Result<(), &'static str> {
    if !age_hours.is_finite() || age_hours < 0.0 {
        return Err("age must be zero or more hours");
    }
    Ok(())
}

/// Validate consignment quantity is a positive finite weight
pub fn validate_quantity_kg(quantity_kg: f64) -> Result<(), &'static str> {
    if !quantity_kg.is_finite() || quantity_kg <= 0.0 {
        return Err("quantity must be a positive weight in kg");
    }
    Ok(())
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Every request inside the documented invariants is accepted
        #[test]
        fn in_range_requests_are_accepted(
            temperature in -10.0..=60.0f64,
            humidity in 0.0..=100.0f64,
            age in 0.0..=500.0f64,
            quantity in 0.1..=5000.0f64
        ) {
            let mut request = AssessmentRequest::new("tomato", temperature, humidity, "Mumbai");
            request.age_hours = age;
            request.quantity_kg = quantity;
            prop_assert!(validate_request(&request).is_ok());
        }

        /// Every out-of-range temperature or humidity is rejected
        #[test]
        fn out_of_range_readings_are_rejected(
            temperature in prop_oneof![-1000.0..-10.001f64, 60.001..1000.0f64],
            humidity in prop_oneof![-1000.0..-0.001f64, 100.001..1000.0f64]
        ) {
            let bad_temperature =
                AssessmentRequest::new("tomato", temperature, 50.0, "Mumbai");
            prop_assert!(validate_request(&bad_temperature).is_err());

            let bad_humidity = AssessmentRequest::new("tomato", 25.0, humidity, "Mumbai");
            prop_assert!(validate_request(&bad_humidity).is_err());
        }
    }
}
