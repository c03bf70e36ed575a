//! E-signature routes.

use axum::{
    Json, Router,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::auth::AuthUser;
use crate::routes::domain_error;
use novafin_core::signature::SignatureError;
use novafin_db::repositories::SigningInput;

/// Creates the signature routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signatures/pending", get(pending))
        .route("/signatures/{id}", get(detail))
        .route("/signatures/{id}/sign", post(sign))
}

fn signature_error(e: &SignatureError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Signature operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

/// GET /signatures/pending - Open signature requests, oldest first.
async fn pending(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.signatures().pending_for_user(user.user_id()).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "requests": rows }))).into_response(),
        Err(e) => signature_error(&e),
    }
}

/// GET /signatures/{id} - One signature request, owner only.
async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.signatures().find_for_user(user.user_id(), id).await {
        Ok(req) => (StatusCode::OK, Json(json!({ "request": req }))).into_response(),
        Err(e) => signature_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct SignRequest {
    signature_text: String,
    consent_text: String,
}

fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map_or_else(|| addr.ip().to_string(), |ip| ip.trim().to_string())
}

/// POST /signatures/{id}/sign - Sign a pending request.
///
/// Records the signer's IP and user agent in the audit trail.
async fn sign(
    State(state): State<AppState>,
    user: AuthUser,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SignRequest>,
) -> impl IntoResponse {
    let input = SigningInput {
        signature_text: payload.signature_text,
        consent_text: payload.consent_text,
        ip_address: client_ip(&headers, addr),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string(),
    };

    match state.signatures().sign(user.user_id(), id, input).await {
        Ok(artifacts) => {
            info!(
                request_id = %id,
                user_id = %user.user_id(),
                application_signed = artifacts.application_signed,
                "Signature recorded"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "request": artifacts.request,
                    "application_signed": artifacts.application_signed,
                })),
            )
                .into_response()
        }
        Err(e) => signature_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(client_ip(&headers, addr), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "192.0.2.4:443".parse().unwrap();
        assert_eq!(client_ip(&headers, addr), "192.0.2.4");
    }
}
