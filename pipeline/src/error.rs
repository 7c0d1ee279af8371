//! Error handling for the crop assessment pipeline
//!
//! Collaborator unavailability is recovered locally by the stages and never
//! surfaces here; callers only ever see a rejected request, a terminally
//! failed run, or a configuration/internal fault.

use serde::Serialize;
use shared::{RequestValidationError, Stage};
use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed or out-of-range request; no stage was run
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// A collaborator could not be reached
    #[error("{stage} stage unavailable: {reason}")]
    StageUnavailable { stage: Stage, reason: String },

    /// An internal computation fault inside a stage
    #[error("{stage} stage execution failed: {reason}")]
    StageExecution { stage: Stage, reason: String },

    /// Terminal run failure; no assessment was produced
    #[error("Run failed in {stage} stage: {reason}")]
    RunFailed { stage: Stage, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RequestValidationError> for PipelineError {
    fn from(err: RequestValidationError) -> Self {
        PipelineError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl PipelineError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Validation { .. } => "VALIDATION_ERROR",
            PipelineError::StageUnavailable { .. } => "STAGE_UNAVAILABLE",
            PipelineError::StageExecution { .. } => "STAGE_EXECUTION_ERROR",
            PipelineError::RunFailed { .. } => "RUN_FAILED",
            PipelineError::Configuration(_) => "CONFIGURATION_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The stage this error originated in, when it has one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::StageUnavailable { stage, .. }
            | PipelineError::StageExecution { stage, .. }
            | PipelineError::RunFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Structured response for callers
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                stage: self.stage(),
            },
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

/// Result type alias for the pipeline
pub type PipelineResult<T> = Result<T, PipelineError>;
