//! Payment gateway HTTP clients.
//!
//! Thin `reqwest` wrappers around the two hosted gateways. Failures map
//! to `PaymentError::Gateway` with the detail logged, never surfaced to
//! the client verbatim.

use rust_decimal::Decimal;
use serde::Deserialize;

use novafin_core::payment::PaymentError;
use novafin_shared::config::{CardGatewayConfig, CryptoGatewayConfig};

/// A hosted checkout session created at the card gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Gateway session id.
    pub id: String,
    /// Hosted checkout URL to redirect the client to.
    pub url: String,
    /// Payment intent behind the session, when already created.
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// Client for the card gateway's hosted checkout.
#[derive(Clone)]
pub struct CardGateway {
    http: reqwest::Client,
    config: CardGatewayConfig,
}

impl CardGateway {
    /// Creates a new card gateway client.
    #[must_use]
    pub const fn new(http: reqwest::Client, config: CardGatewayConfig) -> Self {
        Self { http, config }
    }

    /// Creates a hosted checkout session for the given amount.
    ///
    /// The amount is submitted in minor units; `reference` becomes the
    /// session's client reference for webhook correlation.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the request fails or the
    /// response cannot be parsed.
    pub async fn create_checkout_session(
        &self,
        amount: Decimal,
        currency: &str,
        reference: &str,
        description: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let minor_units = (amount * Decimal::ONE_HUNDRED)
            .trunc()
            .to_string();

        let params = [
            ("mode", "payment"),
            ("client_reference_id", reference),
            ("line_items[0][price_data][currency]", currency),
            ("line_items[0][price_data][unit_amount]", &minor_units),
            ("line_items[0][price_data][product_data][name]", description),
            ("line_items[0][quantity]", "1"),
            ("success_url", &self.config.success_url),
            ("cancel_url", &self.config.cancel_url),
        ];

        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.config.api_url))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| gateway_err("card", &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "card gateway rejected checkout session");
            return Err(PaymentError::Gateway(format!(
                "card gateway returned {status}"
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| gateway_err("card", &e))
    }
}

/// A crypto payment quote with the pay-to address.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoInvoice {
    /// Gateway payment id.
    pub payment_id: String,
    /// Address the client pays to.
    pub pay_address: String,
    /// Exact crypto amount to pay.
    pub pay_amount: Decimal,
    /// Crypto currency of the quote.
    pub pay_currency: String,
}

/// Client for the crypto gateway's pay-to-address quotes.
#[derive(Clone)]
pub struct CryptoGateway {
    http: reqwest::Client,
    config: CryptoGatewayConfig,
}

impl CryptoGateway {
    /// Creates a new crypto gateway client.
    #[must_use]
    pub const fn new(http: reqwest::Client, config: CryptoGatewayConfig) -> Self {
        Self { http, config }
    }

    /// Requests a payment quote for the given fiat amount.
    ///
    /// `order_id` is our transaction reference; the gateway echoes it in
    /// webhook deliveries for correlation.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the request fails or the
    /// response cannot be parsed.
    pub async fn create_invoice(
        &self,
        amount: Decimal,
        fiat_currency: &str,
        pay_currency: &str,
        order_id: &str,
        description: &str,
    ) -> Result<CryptoInvoice, PaymentError> {
        let body = serde_json::json!({
            "price_amount": amount,
            "price_currency": fiat_currency,
            "pay_currency": pay_currency,
            "order_id": order_id,
            "order_description": description,
        });

        let response = self
            .http
            .post(format!("{}/payment", self.config.api_url))
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| gateway_err("crypto", &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = text, "crypto gateway rejected invoice");
            return Err(PaymentError::Gateway(format!(
                "crypto gateway returned {status}"
            )));
        }

        response
            .json::<CryptoInvoice>()
            .await
            .map_err(|e| gateway_err("crypto", &e))
    }
}

fn gateway_err(which: &str, e: &dyn std::fmt::Display) -> PaymentError {
    tracing::error!(gateway = which, error = %e, "gateway call failed");
    PaymentError::Gateway(format!("{which} gateway unavailable"))
}
