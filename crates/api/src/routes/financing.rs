//! Financing application routes: quotes, the client lifecycle, and the
//! admin review queue.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::routes::domain_error;
use novafin_core::financing::{Acknowledgments, FinancingError, calculate_quote};
use novafin_db::repositories::{CreateApplicationInput, UpdateApplicationInput};

/// Creates the financing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/financing/quote", post(quote))
        .route("/financing", post(create).get(list))
        .route("/financing/{id}", get(detail).put(update))
        .route("/financing/{id}/submit", post(submit))
        .route("/financing/{id}/installments", get(installments))
        .route("/admin/financing", get(admin_list))
        .route("/admin/financing/{id}/review", post(admin_review))
        .route("/admin/financing/{id}/approve", post(admin_approve))
        .route("/admin/financing/{id}/reject", post(admin_reject))
        .route("/admin/financing/{id}/cancel", post(admin_cancel))
}

fn financing_error(e: &FinancingError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Financing operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

fn default_fee(state: &AppState) -> Decimal {
    state
        .config
        .financing
        .default_fee_percentage
        .parse()
        .unwrap_or_else(|_| Decimal::new(400, 2))
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    amount: Decimal,
    period_months: u32,
    fee_percentage: Option<Decimal>,
}

/// POST /financing/quote - Compute terms without creating anything.
async fn quote(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<QuoteRequest>,
) -> impl IntoResponse {
    let fee = payload.fee_percentage.unwrap_or_else(|| default_fee(&state));
    match calculate_quote(payload.amount, payload.period_months, fee) {
        Ok(q) => (StatusCode::OK, Json(json!({ "quote": q }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct CreateApplicationRequest {
    amount: Decimal,
    period_months: u32,
    purpose: Option<String>,
    #[serde(default)]
    acknowledgments: Acknowledgments,
}

/// POST /financing - Create a draft application.
async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateApplicationRequest>,
) -> impl IntoResponse {
    let input = CreateApplicationInput {
        amount: payload.amount,
        period_months: payload.period_months,
        fee_percentage: default_fee(&state),
        purpose: payload.purpose,
        acknowledgments: payload.acknowledgments,
    };

    match state.financing().create(user.user_id(), input).await {
        Ok(app) => {
            info!(user_id = %user.user_id(), reference = %app.reference, "Financing application created");
            (StatusCode::CREATED, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => financing_error(&e),
    }
}

/// GET /financing - The current user's applications, newest first.
async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.financing().list_for_user(user.user_id()).await {
        Ok(apps) => (StatusCode::OK, Json(json!({ "applications": apps }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

/// GET /financing/{id} - One application, owner only.
async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.financing().find_for_user(user.user_id(), id).await {
        Ok(app) => (StatusCode::OK, Json(json!({ "application": app }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateApplicationRequest {
    amount: Option<Decimal>,
    period_months: Option<u32>,
    purpose: Option<String>,
    acknowledgments: Option<Acknowledgments>,
}

/// PUT /financing/{id} - Edit a draft; terms are locked after submission.
async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationRequest>,
) -> impl IntoResponse {
    let input = UpdateApplicationInput {
        amount: payload.amount,
        period_months: payload.period_months,
        purpose: payload.purpose,
        acknowledgments: payload.acknowledgments,
    };

    match state.financing().update(user.user_id(), id, input).await {
        Ok(app) => (StatusCode::OK, Json(json!({ "application": app }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

/// POST /financing/{id}/submit - Submit a draft for fee payment.
async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.financing().submit(user.user_id(), id).await {
        Ok(app) => {
            info!(reference = %app.reference, "Financing application submitted");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => financing_error(&e),
    }
}

/// GET /financing/{id}/installments - The repayment schedule, owner only.
async fn installments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = state.financing();
    // Ownership check first; installments have no user column.
    if let Err(e) = repo.find_for_user(user.user_id(), id).await {
        return financing_error(&e);
    }
    match repo.list_installments(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "installments": rows }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

/// GET /admin/financing - Every application, newest first.
async fn admin_list(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    match state.financing().list_all().await {
        Ok(apps) => (StatusCode::OK, Json(json!({ "applications": apps }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

/// POST /admin/financing/{id}/review - Move a signed application into review.
async fn admin_review(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.financing().start_review(id).await {
        Ok(app) => (StatusCode::OK, Json(json!({ "application": app }))).into_response(),
        Err(e) => financing_error(&e),
    }
}

/// POST /admin/financing/{id}/approve - Approve and activate; generates
/// the repayment schedule.
async fn admin_approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.financing().approve(id, admin.user_id()).await {
        Ok(app) => {
            info!(reference = %app.reference, approver = %admin.user_id(), "Financing application approved");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => financing_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    reason: String,
}

/// POST /admin/financing/{id}/reject - Reject with a reason.
async fn admin_reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> impl IntoResponse {
    match state
        .financing()
        .reject(id, admin.user_id(), &payload.reason)
        .await
    {
        Ok(app) => {
            info!(reference = %app.reference, "Financing application rejected");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => financing_error(&e),
    }
}

/// POST /admin/financing/{id}/cancel - Cancel an application.
async fn admin_cancel(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.financing().cancel(id, admin.user_id()).await {
        Ok(app) => {
            info!(reference = %app.reference, "Financing application cancelled");
            (StatusCode::OK, Json(json!({ "application": app }))).into_response()
        }
        Err(e) => financing_error(&e),
    }
}
