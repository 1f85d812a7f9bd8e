//! Error response DTOs.

use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::error::ValidationFieldError;

/// Standard error response format.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    pub fn not_found_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new("NOT_FOUND", &format!("{entity} not found")).with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        }))
    }

    pub fn duplicate_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new("DUPLICATE_ENTRY", &format!("{entity} already exists")).with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        }))
    }

    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::new("VALIDATION_ERROR", &format!("Validation failed for {field}"))
            .with_details(json!({ "field": field, "reason": reason }))
    }

    pub fn validation_errors(errors: &[ValidationFieldError]) -> Self {
        Self::new("VALIDATION_ERROR", "Request validation failed")
            .with_details(json!({ "errors": errors }))
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}
