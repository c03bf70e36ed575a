//! Payment routes: card checkout sessions and crypto quotes.
//!
//! A payment row is created before the gateway is called so the webhook
//! always has something to settle against.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::gateways::{CardGateway, CryptoGateway};
use crate::middleware::auth::AuthUser;
use crate::routes::domain_error;
use novafin_core::financing::{ApplicationStatus, FinancingError};
use novafin_core::payment::{PaymentError, PaymentMethod, PaymentStatus, PaymentType};
use novafin_db::repositories::CreatePaymentInput;

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list))
        .route("/payments/{id}", get(detail))
        .route("/payments/card/checkout", post(card_checkout))
        .route("/payments/crypto/quote", post(crypto_quote))
        .route("/payments/scheduled", get(list_scheduled).post(schedule))
        .route("/payments/scheduled/{id}", delete(cancel_scheduled))
}

fn payment_error(e: &PaymentError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Payment operation failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

fn financing_error(e: &FinancingError) -> axum::response::Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Payment target lookup failed");
    }
    domain_error(e.status_code(), e.error_code(), e.to_string())
}

/// GET /payments - The current user's payments, newest first.
async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.payments().list_for_user(user.user_id()).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "payments": rows }))).into_response(),
        Err(e) => payment_error(&e),
    }
}

/// GET /payments/{id} - One payment, owner only.
async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payments().find_for_user(user.user_id(), id).await {
        Ok(p) => (StatusCode::OK, Json(json!({ "payment": p }))).into_response(),
        Err(e) => payment_error(&e),
    }
}

/// What a checkout pays for, resolved and ownership-checked.
struct PaymentTarget {
    payment_type: PaymentType,
    amount: Decimal,
    application_id: Option<Uuid>,
    installment_id: Option<Uuid>,
    description: String,
}

/// Resolves the target of a payment request to an amount owed.
///
/// Fee payments require the application to be awaiting its fee;
/// installment payments require an outstanding balance.
async fn resolve_target(
    state: &AppState,
    user_id: Uuid,
    application_id: Option<Uuid>,
    installment_id: Option<Uuid>,
) -> Result<PaymentTarget, axum::response::Response> {
    let financing = state.financing();

    if let Some(installment_id) = installment_id {
        let installment = financing
            .find_installment(installment_id)
            .await
            .map_err(|e| financing_error(&e))?;
        let app = financing
            .find_for_user(user_id, installment.financing_application_id)
            .await
            .map_err(|e| financing_error(&e))?;

        let outstanding = installment.amount - installment.amount_paid;
        if outstanding <= Decimal::ZERO {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "already_paid",
                    "message": "This installment has no outstanding balance"
                })),
            )
                .into_response());
        }

        return Ok(PaymentTarget {
            payment_type: PaymentType::Installment,
            amount: outstanding,
            application_id: Some(app.id),
            installment_id: Some(installment.id),
            description: format!(
                "Installment #{} for {}",
                installment.sequence, app.reference
            ),
        });
    }

    if let Some(application_id) = application_id {
        let app = financing
            .find_for_user(user_id, application_id)
            .await
            .map_err(|e| financing_error(&e))?;

        if ApplicationStatus::parse(&app.status) != Some(ApplicationStatus::PendingFee) {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "fee_not_due",
                    "message": "This application is not awaiting its fee payment"
                })),
            )
                .into_response());
        }

        return Ok(PaymentTarget {
            payment_type: PaymentType::Fee,
            amount: app.fee_amount,
            application_id: Some(app.id),
            installment_id: None,
            description: format!("Application fee for {}", app.reference),
        });
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "missing_target",
            "message": "Provide application_id or installment_id"
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct CardCheckoutRequest {
    application_id: Option<Uuid>,
    installment_id: Option<Uuid>,
}

/// POST /payments/card/checkout - Create a hosted card checkout session.
async fn card_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CardCheckoutRequest>,
) -> impl IntoResponse {
    let target = match resolve_target(
        &state,
        user.user_id(),
        payload.application_id,
        payload.installment_id,
    )
    .await
    {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let payments = state.payments();
    let payment = match payments
        .create(CreatePaymentInput {
            user_id: user.user_id(),
            financing_application_id: target.application_id,
            installment_id: target.installment_id,
            payment_type: target.payment_type,
            payment_method: PaymentMethod::Card,
            amount: target.amount,
            currency: "USD".to_string(),
            description: Some(target.description.clone()),
        })
        .await
    {
        Ok(p) => p,
        Err(e) => return payment_error(&e),
    };

    let gateway = CardGateway::new(state.http.clone(), state.config.gateways.card.clone());
    let session = match gateway
        .create_checkout_session(
            target.amount,
            "usd",
            &payment.transaction_reference,
            &target.description,
        )
        .await
    {
        Ok(s) => s,
        Err(e) => return payment_error(&e),
    };

    let payment = match payments
        .attach_card_session(payment.id, &session.id, session.payment_intent)
        .await
    {
        Ok(p) => p,
        Err(e) => return payment_error(&e),
    };

    info!(payment_id = %payment.id, reference = %payment.transaction_reference, "Card checkout session created");

    (
        StatusCode::CREATED,
        Json(json!({ "payment": payment, "checkout_url": session.url })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct CryptoQuoteRequest {
    application_id: Option<Uuid>,
    installment_id: Option<Uuid>,
    pay_currency: String,
}

/// POST /payments/crypto/quote - Create a pay-to-address crypto quote.
async fn crypto_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CryptoQuoteRequest>,
) -> impl IntoResponse {
    let target = match resolve_target(
        &state,
        user.user_id(),
        payload.application_id,
        payload.installment_id,
    )
    .await
    {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let payments = state.payments();
    let payment = match payments
        .create(CreatePaymentInput {
            user_id: user.user_id(),
            financing_application_id: target.application_id,
            installment_id: target.installment_id,
            payment_type: target.payment_type,
            payment_method: PaymentMethod::Crypto,
            amount: target.amount,
            currency: "USD".to_string(),
            description: Some(target.description.clone()),
        })
        .await
    {
        Ok(p) => p,
        Err(e) => return payment_error(&e),
    };

    let gateway = CryptoGateway::new(state.http.clone(), state.config.gateways.crypto.clone());
    let invoice = match gateway
        .create_invoice(
            target.amount,
            "usd",
            &payload.pay_currency,
            &payment.transaction_reference,
            &target.description,
        )
        .await
    {
        Ok(i) => i,
        Err(e) => {
            // The row would otherwise sit pending forever.
            if let Err(close_err) = payments.settle(payment, PaymentStatus::Failed).await {
                error!(error = %close_err, "Failed to close payment after gateway error");
            }
            return payment_error(&e);
        }
    };

    let order_id = payment.transaction_reference.clone();
    let payment = match payments
        .attach_crypto_invoice(
            payment.id,
            &invoice.payment_id,
            &order_id,
            Some(invoice.pay_address.clone()),
            Some(invoice.pay_amount),
            Some(invoice.pay_currency.clone()),
        )
        .await
    {
        Ok(p) => p,
        Err(e) => return payment_error(&e),
    };

    // Funds are now awaited on-chain.
    let payment = match payments.settle(payment, PaymentStatus::Processing).await {
        Ok(s) => s.payment,
        Err(e) => return payment_error(&e),
    };

    info!(payment_id = %payment.id, reference = %payment.transaction_reference, "Crypto quote created");

    (
        StatusCode::CREATED,
        Json(json!({
            "payment": payment,
            "pay_address": invoice.pay_address,
            "pay_amount": invoice.pay_amount,
            "pay_currency": invoice.pay_currency,
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct SchedulePaymentRequest {
    installment_id: Uuid,
    scheduled_date: NaiveDate,
    payment_method: String,
}

/// POST /payments/scheduled - Schedule a reminder for a future
/// installment payment.
async fn schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SchedulePaymentRequest>,
) -> impl IntoResponse {
    let Some(method) = PaymentMethod::parse(&payload.payment_method) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_method",
                "message": "payment_method must be card or crypto"
            })),
        )
            .into_response();
    };

    if payload.scheduled_date < Utc::now().date_naive() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_date",
                "message": "scheduled_date cannot be in the past"
            })),
        )
            .into_response();
    }

    // Installments carry no owner; resolve it through the application.
    let financing = state.financing();
    let installment = match financing.find_installment(payload.installment_id).await {
        Ok(i) => i,
        Err(e) => return financing_error(&e),
    };
    if let Err(e) = financing
        .find_for_user(user.user_id(), installment.financing_application_id)
        .await
    {
        return financing_error(&e);
    }

    match state
        .payments()
        .schedule(
            user.user_id(),
            installment.id,
            payload.scheduled_date,
            method,
        )
        .await
    {
        Ok(row) => {
            info!(user_id = %user.user_id(), installment_id = %installment.id, "Payment scheduled");
            (StatusCode::CREATED, Json(json!({ "scheduled_payment": row }))).into_response()
        }
        Err(e) => payment_error(&e),
    }
}

/// GET /payments/scheduled - Unprocessed scheduled payments.
async fn list_scheduled(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match state.payments().list_scheduled(user.user_id()).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(json!({ "scheduled_payments": rows })),
        )
            .into_response(),
        Err(e) => payment_error(&e),
    }
}

/// DELETE /payments/scheduled/{id} - Cancel a scheduled payment.
async fn cancel_scheduled(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payments().cancel_scheduled(user.user_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => payment_error(&e),
    }
}
