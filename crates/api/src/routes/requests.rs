//! Client request routes: service requests and the admin response queue.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::routes::domain_error;
use novafin_core::request::{ClientRequestError, ClientRequestStatus};
use novafin_db::repositories::CreateClientRequestInput;

/// Creates the client request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create).get(list))
        .route("/requests/{id}", get(detail))
        .route("/admin/requests", get(admin_queue))
        .route("/admin/requests/{id}/review", post(admin_review))
        .route("/admin/requests/{id}/respond", post(admin_respond))
}

fn request_error(e: &ClientRequestError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Client request operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    request_type: String,
    financing_application_id: Option<Uuid>,
    subject: String,
    description: Option<String>,
    #[serde(default)]
    details: serde_json::Value,
}

/// POST /requests - Open a new service request.
async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRequest>,
) -> impl IntoResponse {
    let input = CreateClientRequestInput {
        request_type: payload.request_type,
        financing_application_id: payload.financing_application_id,
        subject: payload.subject,
        description: payload.description,
        details: payload.details,
    };

    match state.client_requests().create(user.user_id(), input).await {
        Ok(req) => {
            info!(user_id = %user.user_id(), request_id = %req.id, "Client request opened");
            (StatusCode::CREATED, Json(json!({ "request": req }))).into_response()
        }
        Err(e) => request_error(&e),
    }
}

/// GET /requests - The current user's requests, newest first.
async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.client_requests().list_for_user(user.user_id()).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "requests": rows }))).into_response(),
        Err(e) => request_error(&e),
    }
}

/// GET /requests/{id} - One request, owner only.
async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state
        .client_requests()
        .find_for_user(user.user_id(), id)
        .await
    {
        Ok(req) => (StatusCode::OK, Json(json!({ "request": req }))).into_response(),
        Err(e) => request_error(&e),
    }
}

/// GET /admin/requests - Open requests, oldest first.
async fn admin_queue(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    match state.client_requests().list_open().await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "requests": rows }))).into_response(),
        Err(e) => request_error(&e),
    }
}

/// POST /admin/requests/{id}/review - Claim a pending request.
async fn admin_review(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state
        .client_requests()
        .start_review(id, admin.user_id())
        .await
    {
        Ok(req) => (StatusCode::OK, Json(json!({ "request": req }))).into_response(),
        Err(e) => request_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct RespondRequest {
    status: String,
    response: String,
}

/// POST /admin/requests/{id}/respond - Resolve a request with a written
/// response. Accepted statuses: approved, rejected, completed.
async fn admin_respond(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> impl IntoResponse {
    let new_status = match payload.status.as_str() {
        "approved" => ClientRequestStatus::Approved,
        "rejected" => ClientRequestStatus::Rejected,
        "completed" => ClientRequestStatus::Completed,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!("Cannot resolve a request as '{other}'")
                })),
            )
                .into_response();
        }
    };

    match state
        .client_requests()
        .respond(id, admin.user_id(), new_status, &payload.response)
        .await
    {
        Ok(req) => {
            info!(request_id = %id, status = %payload.status, "Client request resolved");
            (StatusCode::OK, Json(json!({ "request": req }))).into_response()
        }
        Err(e) => request_error(&e),
    }
}
