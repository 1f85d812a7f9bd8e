//! Notification API handlers.
//!
//! Read access for the notification center: listing a user's
//! notifications and marking one as read.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    routing::{get, post},
};
use uuid::Uuid;

use crate::api::dto::{NotificationListQuery, NotificationListResponse};
use crate::api::extract::ValidatedQuery;
use crate::error::AppResult;
use crate::models::Notification;
use crate::state::AppState;

/// Routes:
/// - GET /users/{user_id}/notifications - Page through a user's notifications
/// - POST /notifications/{id}/read      - Mark one notification read
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/notifications", get(list_user_notifications))
        .route("/notifications/{id}/read", post(mark_notification_read))
}

async fn list_user_notifications(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
    ValidatedQuery(query): ValidatedQuery<NotificationListQuery>,
) -> AppResult<Json<NotificationListResponse>> {
    let Path(user_id) = user_id?;
    let pagination = query.pagination();

    let page = state
        .services
        .notifications
        .list_for_user(user_id, query.unread_only, pagination.page, pagination.page_size)
        .await?;

    Ok(Json(NotificationListResponse::new(page, pagination)))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Notification>> {
    let Path(id) = id?;
    let notification = state.services.notifications.mark_read(id).await?;
    Ok(Json(notification))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::api::routes::create_router;
    use crate::api::test_support::{self, SERVICE_TOKEN};

    fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const USER: &str = "7f9c24e5-2f4b-4d7e-9a51-3c0d8e6b1a20";

    #[tokio::test]
    async fn test_listing_requires_service_token() {
        let uri = format!("/api/users/{USER}/notifications");

        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, &uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_cron_secret_does_not_open_notifications() {
        let uri = format!("/api/users/{USER}/notifications");

        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, &uri, Some(test_support::CRON_SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_size_is_bounded() {
        let uri = format!("/api/users/{USER}/notifications?page_size=500");

        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, &uri, Some(SERVICE_TOKEN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "page_size");
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_bad_request() {
        let response = create_router(test_support::state())
            .oneshot(request(
                Method::GET,
                "/api/users/not-a-uuid/notifications",
                Some(SERVICE_TOKEN),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mark_read_rejects_malformed_id() {
        let response = create_router(test_support::state())
            .oneshot(request(
                Method::POST,
                "/api/notifications/42/read",
                Some(SERVICE_TOKEN),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_database_outage_is_service_unavailable() {
        let uri = format!("/api/users/{USER}/notifications?unread_only=true");

        let response = create_router(test_support::state())
            .oneshot(request(Method::GET, &uri, Some(SERVICE_TOKEN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
