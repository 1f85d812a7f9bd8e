//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;

use crate::api::handlers;
use crate::api::middleware::{
    logging_middleware, request_id_middleware, require_cron_secret, require_service_token,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Response compression (outermost), negotiated from `Accept-Encoding`,
///    so it sees the final body after request IDs are stamped into errors
/// 2. Request ID middleware - generates/propagates request IDs
/// 3. Logging middleware - logs requests with request IDs
/// 4. Bearer checks, per route group
///
/// # Routes
/// - `/health`, `/health/live`, `/health/ready`
/// - `/api/cron/proximity-alerts` - cron secret
/// - `/api/users/{user_id}/notifications`, `/api/notifications/{id}/read` - service token
pub fn create_router(state: AppState) -> Router {
    let cron_routes = handlers::cron::cron_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_cron_secret,
    ));

    let notification_routes = handlers::notifications::notification_routes().route_layer(
        middleware::from_fn_with_state(state.clone(), require_service_token),
    );

    let api_routes = Router::new()
        .nest("/cron", cron_routes)
        .merge(notification_routes);

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .with_state(state)
}
