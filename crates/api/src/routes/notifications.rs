//! In-app notification routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::auth::AuthUser;

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "Failed to process notifications"
        })),
    )
        .into_response()
}

/// GET /notifications - All notifications for the current user, newest first.
async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.notifier().list_for_user(user.user_id()).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "notifications": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list notifications");
            internal_error()
        }
    }
}

/// GET /notifications/unread-count - Badge count.
async fn unread_count(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.notifier().unread_count(user.user_id()).await {
        Ok(count) => (StatusCode::OK, Json(json!({ "unread": count }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to count notifications");
            internal_error()
        }
    }
}

/// POST /notifications/{id}/read - Mark one notification read.
async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.notifier().mark_read(user.user_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(DbErr::RecordNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Notification not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to mark notification read");
            internal_error()
        }
    }
}

/// POST /notifications/read-all - Mark every notification read.
async fn mark_all_read(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.notifier().mark_all_read(user.user_id()).await {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to mark notifications read");
            internal_error()
        }
    }
}
