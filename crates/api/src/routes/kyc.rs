//! Identity verification routes: client uploads and the review queue.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
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
use novafin_core::kyc::KycError;
use novafin_db::repositories::UploadKycDocumentInput;

/// Creates the identity verification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kyc", get(status))
        .route("/kyc/documents", post(upload_document))
        .route("/kyc/submit", post(submit))
        .route("/admin/kyc", get(admin_queue))
        .route("/admin/kyc/{id}/review", post(admin_review))
        .route("/admin/kyc/{id}/approve", post(admin_approve))
        .route("/admin/kyc/{id}/reject", post(admin_reject))
}

fn kyc_error(e: &KycError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "KYC operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

/// GET /kyc - The current user's application and uploaded documents.
async fn status(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    let repo = state.kyc();
    let app = match repo.get_or_create(user.user_id()).await {
        Ok(a) => a,
        Err(e) => return kyc_error(&e),
    };
    let documents = match repo.list_documents(user.user_id()).await {
        Ok(d) => d,
        Err(e) => return kyc_error(&e),
    };
    (
        StatusCode::OK,
        Json(json!({ "application": app, "documents": documents })),
    )
        .into_response()
}

/// POST /kyc/documents - Upload one identity document (multipart).
///
/// Fields: `document_type` (required), `file` (required), `notes`.
async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut document_type: Option<String> = None;
    let mut notes: Option<String> = None;
    let mut file_name = String::new();
    let mut content_type = String::from("application/octet-stream");
    let mut bytes: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_multipart",
                        "message": format!("Malformed multipart body: {e}")
                    })),
                )
                    .into_response();
            }
        };

        match field.name() {
            Some("document_type") => {
                document_type = field.text().await.ok();
            }
            Some("notes") => {
                notes = field.text().await.ok().filter(|s| !s.is_empty());
            }
            Some("file") => {
                file_name = field.file_name().unwrap_or("upload").to_string();
                if let Some(ct) = field.content_type() {
                    content_type = ct.to_string();
                }
                match field.bytes().await {
                    Ok(b) => bytes = Some(b.to_vec()),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "invalid_multipart",
                                "message": format!("Failed to read file field: {e}")
                            })),
                        )
                            .into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let (Some(document_type), Some(bytes)) = (document_type, bytes) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_field",
                "message": "Both document_type and file are required"
            })),
        )
            .into_response();
    };

    let input = UploadKycDocumentInput {
        document_type,
        file_name,
        content_type,
        bytes,
        notes,
    };

    match state.kyc().upload_document(user.user_id(), input).await {
        Ok(doc) => {
            info!(user_id = %user.user_id(), document_id = %doc.id, "KYC document uploaded");
            (StatusCode::CREATED, Json(json!({ "document": doc }))).into_response()
        }
        Err(e) => kyc_error(&e),
    }
}

/// POST /kyc/submit - Submit the application for review.
async fn submit(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.kyc().submit(user.user_id()).await {
        Ok(app) => {
            info!(user_id = %user.user_id(), "KYC application submitted");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => kyc_error(&e),
    }
}

/// GET /admin/kyc - Applications waiting on review, oldest submission first.
async fn admin_queue(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    match state.kyc().list_pending().await {
        Ok(apps) => (StatusCode::OK, Json(json!({ "applications": apps }))).into_response(),
        Err(e) => kyc_error(&e),
    }
}

/// POST /admin/kyc/{id}/review - Claim an application for review.
async fn admin_review(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.kyc().start_review(id, admin.user_id()).await {
        Ok(app) => (StatusCode::OK, Json(json!({ "application": app }))).into_response(),
        Err(e) => kyc_error(&e),
    }
}

/// POST /admin/kyc/{id}/approve - Approve a reviewed application.
async fn admin_approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.kyc().approve(id, admin.user_id()).await {
        Ok(app) => {
            info!(application_id = %id, reviewer = %admin.user_id(), "KYC application approved");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => kyc_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    reason: String,
}

/// POST /admin/kyc/{id}/reject - Reject with a reason the client will see.
async fn admin_reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> impl IntoResponse {
    match state
        .kyc()
        .reject(id, admin.user_id(), &payload.reason)
        .await
    {
        Ok(app) => {
            info!(application_id = %id, reviewer = %admin.user_id(), "KYC application rejected");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => kyc_error(&e),
    }
}
