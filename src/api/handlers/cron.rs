//! Scheduled-trigger handlers.
//!
//! An external scheduler calls these endpoints with the cron secret; the
//! bearer check lives in the route layer.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::{error, info};

use crate::api::dto::CronRunResponse;
use crate::state::AppState;

/// Routes:
/// - GET /proximity-alerts  - Run one matching pass
/// - POST /proximity-alerts - Same, for manual triggers
pub fn cron_routes() -> Router<AppState> {
    Router::new().route(
        "/proximity-alerts",
        get(run_proximity_alerts).post(run_proximity_alerts),
    )
}

async fn run_proximity_alerts(State(state): State<AppState>) -> (StatusCode, Json<CronRunResponse>) {
    match state.services.matcher.run().await {
        Ok(report) => {
            info!(
                jobs_checked = report.jobs_checked,
                alerts_checked = report.alerts_checked,
                notifications_sent = report.notifications_sent,
                notifications_failed = report.notifications_failed,
                "Proximity alert pass finished"
            );
            (StatusCode::OK, Json(CronRunResponse::success(report)))
        }
        Err(e) => {
            error!(error = ?e, "Proximity alert pass failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CronRunResponse::failure(&e)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::api::routes::create_router;
    use crate::api::test_support::{self, CRON_SECRET};

    use super::*;

    fn request(method: Method, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri("/api/cron/proximity-alerts");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_secret_is_unauthorized() {
        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, Some("guess")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unset_secret_rejects_every_call() {
        let state = test_support::state_with(true, "", test_support::SERVICE_TOKEN);

        let response = create_router(state)
            .oneshot(request(Method::GET, Some("")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_successful_pass_reports_counts() {
        for method in [Method::GET, Method::POST] {
            let response = create_router(test_support::state())
                .oneshot(request(method, Some(CRON_SECRET)))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["jobs_checked"], 0);
            assert_eq!(body["notifications_sent"], 0);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_retryable_503() {
        let state = test_support::state_with(false, CRON_SECRET, test_support::SERVICE_TOKEN);

        let response = create_router(state)
            .oneshot(request(Method::GET, Some(CRON_SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["retryable"], true);
        assert_eq!(body["processed"], 0);
        assert!(body["error"].is_string());
    }
}
