//! Public content routes: informational pages and FAQ.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Creates the public content routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/content/pages/{slug}", get(page_by_slug))
        .route("/content/faq", get(list_faq))
}

/// GET /content/pages/{slug} - A published page, 404 otherwise.
async fn page_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> impl IntoResponse {
    match state.content().page_by_slug(&slug).await {
        Ok(Some(page)) => (StatusCode::OK, Json(json!({ "page": page }))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Page not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, slug, "Failed to load page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to load page"
                })),
            )
                .into_response()
        }
    }
}

/// GET /content/faq - Published FAQ entries in display order.
async fn list_faq(State(state): State<AppState>) -> impl IntoResponse {
    match state.content().list_faq().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "faq": items }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load FAQ");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to load FAQ"
                })),
            )
                .into_response()
        }
    }
}
