//! User account and profile routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::middleware::auth::AuthUser;
use novafin_db::repositories::UpdateProfileInput;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/me/profile", put(update_profile))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    date_of_birth: Option<NaiveDate>,
    occupation: Option<String>,
    employer: Option<String>,
    monthly_income: Option<Decimal>,
}

/// GET /users/me - Current account with profile.
async fn me(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    let repo = state.users();

    let account = match repo.find_by_id(user.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Account not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load account");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to load account"
                })),
            )
                .into_response();
        }
    };

    let profile = match repo.get_profile(account.id).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to load profile");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to load profile"
                })),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "user": {
                "id": account.id,
                "email": account.email,
                "first_name": account.first_name,
                "last_name": account.last_name,
                "client_id": account.client_id,
                "account_number": account.account_number,
                "role": account.role,
                "mfa_enabled": account.mfa_enabled,
                "created_at": account.created_at,
            },
            "profile": profile,
        })),
    )
        .into_response()
}

/// PUT /users/me/profile - Update the current user's profile.
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let input = UpdateProfileInput {
        phone: payload.phone,
        address_line1: payload.address_line1,
        address_line2: payload.address_line2,
        city: payload.city,
        country: payload.country,
        postal_code: payload.postal_code,
        date_of_birth: payload.date_of_birth,
        occupation: payload.occupation,
        employer: payload.employer,
        monthly_income: payload.monthly_income,
    };

    match state.users().update_profile(user.user_id(), input).await {
        Ok(profile) => (StatusCode::OK, Json(json!({ "profile": profile }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to update profile"
                })),
            )
                .into_response()
        }
    }
}
