//! Document routes: listing, download, and public verification.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::auth::AuthUser;
use crate::routes::domain_error;
use novafin_core::document::DocumentError;

/// Creates the authenticated document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list))
        .route("/documents/{id}", get(detail))
        .route("/documents/{id}/download", get(download))
}

/// Creates the unauthenticated verification route.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/documents/verify/{code}", get(verify))
}

fn doc_error(e: &DocumentError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Document operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

/// GET /documents - All documents issued to the current user, newest first.
async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.documents().list_for_user(user.user_id()).await {
        Ok(docs) => (StatusCode::OK, Json(json!({ "documents": docs }))).into_response(),
        Err(e) => doc_error(&e),
    }
}

/// GET /documents/{id} - Document metadata.
async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.documents().find_for_user(user.user_id(), id).await {
        Ok(doc) => (StatusCode::OK, Json(json!({ "document": doc }))).into_response(),
        Err(e) => doc_error(&e),
    }
}

/// GET /documents/{id}/download - The PDF bytes.
async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.documents().download(user.user_id(), id).await {
        Ok((doc, bytes)) => {
            let disposition = format!("attachment; filename=\"{}.pdf\"", doc.document_number);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => doc_error(&e),
    }
}

/// GET /documents/verify/{code} - Public authenticity check by verification code.
async fn verify(State(state): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    match state.documents().verify_by_code(&code).await {
        Ok(verified) => (
            StatusCode::OK,
            Json(json!({ "valid": true, "document": verified })),
        )
            .into_response(),
        Err(DocumentError::VerificationFailed) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "valid": false,
                "error": "VERIFICATION_FAILED",
                "message": "No document matches the given verification code"
            })),
        )
            .into_response(),
        Err(e) => doc_error(&e),
    }
}
