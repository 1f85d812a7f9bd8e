//! Error handler for converting AppError to HTTP responses.
//!
//! Implements `IntoResponse` for `AppError` so handlers can return
//! `AppResult<T>` directly, and folds axum's extractor rejections into
//! `AppError` so every failure shares the same JSON body.

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// The rendered [`ErrorResponse`] is also stored in the response
    /// extensions so the request-id middleware can stamp it.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }

        let error_response = error_to_body(&self);
        let mut response = (status, Json(error_response.clone())).into_response();
        response.extensions_mut().insert(error_response);
        response
    }
}

fn error_to_body(error: &AppError) -> ErrorResponse {
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => ErrorResponse::not_found_error(entity, field, value),
        AppError::Duplicate {
            entity,
            field,
            value,
        } => ErrorResponse::duplicate_error(entity, field, value),
        AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
        AppError::ValidationErrors { errors } => ErrorResponse::validation_errors(errors),
        AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
        AppError::Unauthorized { message } => ErrorResponse::new("UNAUTHORIZED", message),
        // internals stay in the logs
        AppError::Database { operation, .. } => ErrorResponse::new(
            "DATABASE_ERROR",
            &format!("Database operation failed: {}", operation),
        )
        .with_details(json!({ "operation": operation })),
        AppError::Configuration { key, .. } => {
            ErrorResponse::new("CONFIGURATION_ERROR", &format!("Configuration error: {}", key))
        }
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
        }
        AppError::Internal { .. } => ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => StatusCode::BAD_REQUEST,
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "DUPLICATE_ENTRY",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: format!("Invalid path parameters: {}", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: format!("Invalid query parameters: {}", rejection.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::error::ValidationFieldError;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (
                AppError::NotFound {
                    entity: "notification".to_string(),
                    field: "id".to_string(),
                    value: "1".to_string(),
                },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Duplicate {
                    entity: "users".to_string(),
                    field: "email".to_string(),
                    value: "a@b.c".to_string(),
                },
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
            ),
            (
                AppError::ValidationErrors { errors: Vec::new() },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AppError::Unauthorized {
                    message: "no".to_string(),
                },
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("exhausted"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                AppError::Internal {
                    source: anyhow::anyhow!("boom"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error_to_status_code(&error), status);
            assert_eq!(error_to_code(&error), code);
        }
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::NotFound {
            entity: "notification".to_string(),
            field: "id".to_string(),
            value: "42".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorResponse>().is_some());
        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["details"]["value"], "42");
        assert!(body.get("request_id").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_body_lists_fields() {
        let response = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "page_size".to_string(),
                message: "Page size must be between 1 and 100".to_string(),
            }],
        }
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["details"]["errors"][0]["field"], "page_size");
    }

    #[tokio::test]
    async fn test_internal_details_are_not_exposed() {
        let response = AppError::Internal {
            source: anyhow::anyhow!("password=hunter2"),
        }
        .into_response();

        let body = body_json(response).await;
        assert!(!body.to_string().contains("hunter2"));
    }
}
