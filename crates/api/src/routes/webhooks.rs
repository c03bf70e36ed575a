//! Gateway webhook endpoints.
//!
//! Both endpoints verify the gateway's HMAC signature over the raw body
//! before parsing anything. Events for unknown references and replays of
//! already-settled payments are acknowledged so the gateway stops
//! retrying; signature failures are not.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;
use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_core::payment::{
    CardWebhookEvent, CryptoPaymentStatus, PaymentError, PaymentStatus, PaymentType,
    verify_card_signature, verify_crypto_signature,
};
use novafin_db::entities::payments;
use novafin_db::repositories::NotificationInput;

/// Creates the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/card", post(card_webhook))
        .route("/webhooks/crypto", post(crypto_webhook))
}

fn acknowledged() -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

fn bad_signature() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "INVALID_SIGNATURE",
            "message": "Webhook signature verification failed"
        })),
    )
        .into_response()
}

/// Applies a settled payment to whatever it was paying for.
///
/// Downstream effects (receipt, email) are best effort; the financing
/// transition is not, because dropping it would strand the application.
async fn apply_settlement(state: &AppState, payment: &payments::Model) -> Result<(), axum::response::Response> {
    let financing = state.financing();

    match PaymentType::parse(&payment.payment_type) {
        Some(PaymentType::Fee) => {
            let Some(app_id) = payment.financing_application_id else {
                warn!(payment_id = %payment.id, "Fee payment has no application");
                return Ok(());
            };
            if let Err(e) = financing.confirm_fee(app_id).await {
                error!(error = %e, payment_id = %payment.id, "Failed to confirm fee");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "SETTLEMENT_FAILED",
                        "message": "Failed to apply the payment"
                    })),
                )
                    .into_response());
            }
        }
        Some(PaymentType::Installment) => {
            let Some(installment_id) = payment.installment_id else {
                warn!(payment_id = %payment.id, "Installment payment has no installment");
                return Ok(());
            };
            if let Err(e) = financing
                .apply_installment_payment(installment_id, payment.amount)
                .await
            {
                error!(error = %e, payment_id = %payment.id, "Failed to apply installment payment");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "SETTLEMENT_FAILED",
                        "message": "Failed to apply the payment"
                    })),
                )
                    .into_response());
            }
            // Any pending schedule for this installment is now moot.
            if let Err(e) = state.payments().mark_schedules_processed(installment_id).await {
                warn!(error = %e, installment_id = %installment_id, "Failed to close scheduled payments");
            }
        }
        None => {
            warn!(payment_id = %payment.id, payment_type = %payment.payment_type, "Unknown payment type");
        }
    }

    // Receipt and email are best effort.
    match state.users().find_by_id(payment.user_id).await {
        Ok(Some(user)) => {
            if let Err(e) = state.documents().generate_receipt(payment, &user).await {
                warn!(error = %e, payment_id = %payment.id, "Failed to generate receipt");
            }
            if let Some(email) = &state.email_service {
                let name = format!("{} {}", user.first_name, user.last_name);
                if let Err(e) = email
                    .send_payment_received_email(
                        &user.email,
                        &name,
                        &payment.amount.to_string(),
                        &payment.transaction_reference,
                    )
                    .await
                {
                    warn!(error = %e, payment_id = %payment.id, "Failed to send payment email");
                }
            }
        }
        Ok(None) => warn!(payment_id = %payment.id, "Payment owner not found"),
        Err(e) => warn!(error = %e, "Failed to load payment owner"),
    }

    Ok(())
}

async fn notify_failure(state: &AppState, payment: &payments::Model) {
    let input = NotificationInput {
        user_id: payment.user_id,
        title: "Payment failed".to_string(),
        message: format!(
            "Payment {} for {} {} did not complete. You can retry from your dashboard.",
            payment.transaction_reference, payment.amount, payment.currency
        ),
        category: NotificationCategory::Payment,
        channel: NotificationChannel::Both,
        action_url: Some("/payments".to_string()),
    };
    if let Err(e) = state.notifier().dispatch(input).await {
        warn!(error = %e, payment_id = %payment.id, "Failed to dispatch failure notification");
    }
}

/// Settles a payment and runs downstream effects when it completed.
async fn settle_and_apply(
    state: &AppState,
    payment: payments::Model,
    new_status: PaymentStatus,
) -> axum::response::Response {
    let settlement = match state.payments().settle(payment, new_status).await {
        Ok(s) => s,
        Err(PaymentError::AlreadyClosed(current)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "PAYMENT_ALREADY_CLOSED",
                    "message": format!("Payment already settled as {current}")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to settle payment");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "SETTLEMENT_FAILED",
                    "message": "Failed to settle the payment"
                })),
            )
                .into_response();
        }
    };

    if !settlement.changed {
        info!(payment_id = %settlement.payment.id, "Webhook replay ignored");
        return acknowledged();
    }

    match new_status {
        PaymentStatus::Completed => {
            if let Err(resp) = apply_settlement(state, &settlement.payment).await {
                return resp;
            }
            info!(payment_id = %settlement.payment.id, "Payment settled");
        }
        PaymentStatus::Failed => {
            notify_failure(state, &settlement.payment).await;
            info!(payment_id = %settlement.payment.id, "Payment marked failed");
        }
        _ => {}
    }

    acknowledged()
}

/// POST /webhooks/card - Card gateway event delivery.
async fn card_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let Some(signature) = headers.get("stripe-signature").and_then(|v| v.to_str().ok()) else {
        return bad_signature();
    };

    let secret = &state.config.gateways.card.webhook_secret;
    if let Err(e) =
        verify_card_signature(body.as_bytes(), signature, secret, Utc::now().timestamp())
    {
        warn!(error = %e, "Card webhook signature rejected");
        return bad_signature();
    }

    let event: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Card webhook body is not JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "INVALID_PAYLOAD",
                    "message": "Webhook body is not valid JSON"
                })),
            )
                .into_response();
        }
    };

    let event_type = event["type"].as_str().unwrap_or_default();
    let Some(event_kind) = CardWebhookEvent::parse(event_type) else {
        info!(event_type, "Ignoring unhandled card webhook event");
        return acknowledged();
    };

    let object_id = event["data"]["object"]["id"].as_str().unwrap_or_default();
    let payments = state.payments();
    let lookup = match event_kind {
        CardWebhookEvent::CheckoutCompleted => payments.find_by_card_session(object_id).await,
        CardWebhookEvent::PaymentSucceeded | CardWebhookEvent::PaymentFailed => {
            payments.find_by_payment_intent(object_id).await
        }
    };

    let payment = match lookup {
        Ok(p) => p,
        Err(PaymentError::UnknownGatewayReference(reference)) => {
            warn!(reference, event_type, "Card webhook for unknown payment");
            return acknowledged();
        }
        Err(e) => {
            error!(error = %e, "Failed to look up payment for card webhook");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "LOOKUP_FAILED",
                    "message": "Failed to resolve the payment"
                })),
            )
                .into_response();
        }
    };

    let new_status = match event_kind {
        CardWebhookEvent::CheckoutCompleted | CardWebhookEvent::PaymentSucceeded => {
            PaymentStatus::Completed
        }
        CardWebhookEvent::PaymentFailed => PaymentStatus::Failed,
    };

    settle_and_apply(&state, payment, new_status).await
}

/// POST /webhooks/crypto - Crypto gateway IPN delivery.
async fn crypto_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let Some(signature) = headers
        .get("x-nowpayments-sig")
        .and_then(|v| v.to_str().ok())
    else {
        return bad_signature();
    };

    let secret = &state.config.gateways.crypto.ipn_secret;
    if let Err(e) = verify_crypto_signature(body.as_bytes(), signature, secret) {
        warn!(error = %e, "Crypto webhook signature rejected");
        return bad_signature();
    }

    // Signature verification already proved the body parses as JSON.
    let Ok(event) = serde_json::from_str::<serde_json::Value>(&body) else {
        return bad_signature();
    };

    let raw_status = event["payment_status"].as_str().unwrap_or_default();
    let Some(gateway_status) = CryptoPaymentStatus::parse(raw_status) else {
        info!(raw_status, "Ignoring unhandled crypto payment status");
        return acknowledged();
    };

    let order_id = event["order_id"].as_str().unwrap_or_default();
    let payment = match state.payments().find_by_crypto_order(order_id).await {
        Ok(p) => p,
        Err(PaymentError::UnknownGatewayReference(reference)) => {
            warn!(reference, "Crypto webhook for unknown payment");
            return acknowledged();
        }
        Err(e) => {
            error!(error = %e, "Failed to look up payment for crypto webhook");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "LOOKUP_FAILED",
                    "message": "Failed to resolve the payment"
                })),
            )
                .into_response();
        }
    };

    settle_and_apply(&state, payment, gateway_status.to_payment_status()).await
}
