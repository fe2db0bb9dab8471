//! # Error Handling
//!
//! This module defines the crate's error taxonomy and how each variant is
//! converted to an HTTP response.
//!
//! ## Error Categories:
//! - **InvalidInput**: the client omitted or emptied a required field (400)
//! - **Service**: the external inference call failed or returned nothing usable (500)
//! - **Config**: configuration problems; fatal at startup, never per-request
//! - **Internal**: everything else server-side (500)
//!
//! Every HTTP error body has the shape `{"error": "<message>"}` because that
//! is the wire contract the bundled viewer client expects. `InvalidInput` and
//! `Service` therefore display their message bare, without a category prefix.

use crate::inference::InferenceError;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
#[derive(Debug)]
pub enum AppError {
    /// Client sent invalid or missing data
    InvalidInput(String),

    /// The external inference service call failed
    Service(String),

    /// Configuration file or environment variable problems
    Config(String),

    /// Internal server errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // These two surface verbatim in HTTP bodies.
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::Service(msg) => write!(f, "{}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            AppError::InvalidInput(_) => actix_web::http::StatusCode::BAD_REQUEST,
            AppError::Service(_) | AppError::Config(_) | AppError::Internal(_) => {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        HttpResponse::build(status).json(json!({
            "error": self.to_string()
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Service(err.to_string())
    }
}

/// Type alias for Results that use our custom error type.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400_with_bare_message() {
        let err = AppError::InvalidInput("No image data provided".to_string());
        let response = err.error_response();
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No image data provided");
    }

    #[test]
    fn service_error_maps_to_500() {
        let err = AppError::Service("upstream unavailable".to_string());
        let response = err.error_response();
        assert_eq!(
            response.status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn inference_error_converts_to_service_error() {
        let err: AppError = InferenceError::EmptyResponse.into();
        assert!(matches!(err, AppError::Service(_)));
    }
}
