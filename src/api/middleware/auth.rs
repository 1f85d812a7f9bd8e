//! Shared-secret bearer authentication.
//!
//! Two independent secrets guard the API: the cron secret for the scheduled
//! trigger and the service token for notification access. An empty
//! configured secret rejects every request.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Guards the cron trigger with `matching.cron_secret`.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    verify_bearer(request.headers(), &state.cron_secret)?;
    Ok(next.run(request).await)
}

/// Guards the notification routes with `api.service_token`.
pub async fn require_service_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    verify_bearer(request.headers(), &state.service_token)?;
    Ok(next.run(request).await)
}

/// Checks `Authorization: Bearer <expected>`.
pub fn verify_bearer(headers: &HeaderMap, expected: &str) -> AppResult<()> {
    if expected.is_empty() {
        return Err(AppError::Unauthorized {
            message: "Endpoint is disabled: no secret configured".to_string(),
        });
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })?;

    if token != expected {
        return Err(AppError::Unauthorized {
            message: "Invalid bearer token".to_string(),
        });
    }

    Ok(())
}
