//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. All senders are best-effort from the
//! caller's perspective: the notification dispatcher logs failures and never
//! propagates them to the request that triggered the email.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Returns the frontend base URL, used to build links in email bodies.
    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.config.frontend_url
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build()
            .pipe(Ok)
    }

    /// Sends a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        self.send(to_email, subject, body.to_string(), ContentType::TEXT_PLAIN)
            .await
    }

    /// Sends an HTML email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_html_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        self.send(
            to_email,
            subject,
            html_body.to_string(),
            ContentType::TEXT_HTML,
        )
        .await
    }

    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        body: String,
        content_type: ContentType,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(format!("Novafin - {subject}"))
            .header(content_type)
            .body(body)
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }

    /// Sends the documents-ready-for-signing email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_signing_ready_email(
        &self,
        to_email: &str,
        to_name: &str,
        application_number: &str,
    ) -> Result<(), EmailError> {
        let signing_url = format!("{}/dashboard/signatures", self.config.frontend_url);

        let subject = "Documents Ready for Signing";
        let body = format!(
            r"Hi {to_name},

Your documents for application {application_number} are ready for electronic
signature. Please review and sign within 7 days:

{signing_url}

If you did not apply for financing with Novafin, please contact support.

Best regards,
The Novafin Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Sends the payment-received email with the receipt reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_payment_received_email(
        &self,
        to_email: &str,
        to_name: &str,
        amount: &str,
        reference: &str,
    ) -> Result<(), EmailError> {
        let subject = "Payment Received";
        let body = format!(
            r"Hi {to_name},

Your payment of ${amount} has been confirmed.
Reference: {reference}

A receipt has been added to your documents.

Best regards,
The Novafin Team"
        );

        self.send_email(to_email, subject, &body).await
    }
}

/// Pipe trait for fluent API.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
