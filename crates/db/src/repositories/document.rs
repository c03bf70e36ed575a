//! Document service.
//!
//! Builds document content from application data, renders it to PDF,
//! stores the bytes, and records the metadata row with its SHA-256
//! verification code. Rendering falls back to a plain layout if the
//! branded renderer fails, so document generation degrades rather than
//! blocking the lifecycle operation that triggered it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use novafin_core::document::{
    ContentLine, DocumentContent, DocumentError, DocumentType, SignatureBlock,
    new_document_number, render_pdf, render_pdf_minimal, verification_code,
};
use novafin_core::storage::StorageService;

use crate::entities::{documents, financing_applications, installments, payments, users};

/// Public result of verifying a document by its code.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifiedDocument {
    pub document_number: String,
    pub document_type: String,
    pub title: String,
    pub issued_to: String,
    pub issued_at: DateTime<Utc>,
    pub is_signed: bool,
}

/// Generates, stores, and verifies PDF documents.
#[derive(Clone)]
pub struct DocumentService {
    db: DatabaseConnection,
    storage: Arc<StorageService>,
}

impl DocumentService {
    /// Creates a new document service.
    #[must_use]
    pub fn new(db: DatabaseConnection, storage: Arc<StorageService>) -> Self {
        Self { db, storage }
    }

    fn render(content: &DocumentContent) -> Result<Vec<u8>, DocumentError> {
        match render_pdf(content) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "branded renderer failed, using minimal layout");
                render_pdf_minimal(content)
            }
        }
    }

    async fn persist(
        &self,
        user_id: Uuid,
        doc_type: DocumentType,
        title: &str,
        content: &DocumentContent,
        financing_application_id: Option<Uuid>,
        payment_id: Option<Uuid>,
    ) -> Result<documents::Model, DocumentError> {
        let pdf = Self::render(content)?;
        let code = verification_code(&pdf);
        let number = new_document_number(doc_type);
        let id = Uuid::new_v4();
        let key = StorageService::document_key(user_id, id, &number);

        self.storage
            .store(&key, pdf)
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?;

        let now = Utc::now();
        documents::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            financing_application_id: Set(financing_application_id),
            payment_id: Set(payment_id),
            document_type: Set(doc_type.as_str().to_string()),
            document_number: Set(number),
            title: Set(title.to_string()),
            storage_key: Set(key),
            verification_code: Set(code),
            is_signed: Set(content.signature.is_some()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| DocumentError::Database(e.to_string()))
    }

    fn application_content(
        doc_type: DocumentType,
        app: &financing_applications::Model,
        user: &users::Model,
        signature: Option<SignatureBlock>,
    ) -> DocumentContent {
        let client_name = format!("{} {}", user.first_name, user.last_name);
        let mut content = match doc_type {
            DocumentType::Certificate => DocumentContent::new("Financing Certificate")
                .text(format!("Reference: {}", app.reference))
                .divider()
                .heading("Client")
                .text(format!("Name: {client_name}"))
                .text(format!("Client ID: {}", user.client_id))
                .text(format!("Account: {}", user.account_number))
                .divider()
                .heading("Financing Terms")
                .text(format!("Principal amount: {} USD", app.amount))
                .text(format!("Repayment period: {} months", app.period_months))
                .text(format!(
                    "Service fee ({}%): {} USD",
                    app.fee_percentage, app.fee_amount
                ))
                .text(format!("Monthly installment: {} USD", app.monthly_installment))
                .text(format!("Total repayable: {} USD", app.total_with_fee))
                .divider()
                .text(
                    "This certificate confirms that the client named above has been \
                     granted financing under the terms stated.",
                ),
            DocumentType::Contract => DocumentContent::new("Financing Contract")
                .text(format!("Reference: {}", app.reference))
                .divider()
                .heading("Parties")
                .text("Lender: Novafin Financial Services")
                .text(format!("Client: {client_name} ({})", user.client_id))
                .divider()
                .heading("Terms and Conditions")
                .text(format!(
                    "1. The lender provides financing of {} USD to the client.",
                    app.amount
                ))
                .text(format!(
                    "2. The client repays {} monthly installments of {} USD each.",
                    app.period_months, app.monthly_installment
                ))
                .text(format!(
                    "3. A non-refundable service fee of {} USD applies.",
                    app.fee_amount
                ))
                .text(format!(
                    "4. The total amount repayable is {} USD.",
                    app.total_with_fee
                ))
                .text("5. Installments fall due at thirty-day intervals from activation.")
                .divider()
                .text(
                    "By signing electronically the client agrees to be bound by \
                     these terms.",
                ),
            // These three have dedicated builders; only the two signing
            // documents carry the full terms layout.
            DocumentType::Receipt => DocumentContent::new("Payment Receipt")
                .text(format!("Reference: {}", app.reference))
                .text(format!("Client: {client_name}")),
            DocumentType::KycSummary => DocumentContent::new("Identity Verification Summary")
                .text(format!("Client: {client_name}")),
            DocumentType::Statement => DocumentContent::new("Account Statement")
                .text(format!("Reference: {}", app.reference))
                .text(format!("Client: {client_name}")),
        };
        if let Some(block) = signature {
            content = content.signed(block);
        }
        content
    }

    /// Generates the financing certificate for an application.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, storage, or the insert fails.
    pub async fn generate_certificate(
        &self,
        app: &financing_applications::Model,
        user: &users::Model,
    ) -> Result<documents::Model, DocumentError> {
        let content = Self::application_content(DocumentType::Certificate, app, user, None);
        self.persist(
            user.id,
            DocumentType::Certificate,
            &format!("Financing Certificate {}", app.reference),
            &content,
            Some(app.id),
            None,
        )
        .await
    }

    /// Generates the financing contract for an application.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, storage, or the insert fails.
    pub async fn generate_contract(
        &self,
        app: &financing_applications::Model,
        user: &users::Model,
    ) -> Result<documents::Model, DocumentError> {
        let content = Self::application_content(DocumentType::Contract, app, user, None);
        self.persist(
            user.id,
            DocumentType::Contract,
            &format!("Financing Contract {}", app.reference),
            &content,
            Some(app.id),
            None,
        )
        .await
    }

    /// Generates a payment receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, storage, or the insert fails.
    pub async fn generate_receipt(
        &self,
        payment: &payments::Model,
        user: &users::Model,
    ) -> Result<documents::Model, DocumentError> {
        let content = DocumentContent::new("Payment Receipt")
            .text(format!("Reference: {}", payment.transaction_reference))
            .divider()
            .heading("Payment Details")
            .text(format!(
                "Client: {} {} ({})",
                user.first_name, user.last_name, user.client_id
            ))
            .text(format!(
                "Amount: {} {}",
                payment.amount, payment.currency
            ))
            .text(format!("Method: {}", payment.payment_method))
            .text(format!("Type: {}", payment.payment_type))
            .text(format!(
                "Date: {}",
                payment.updated_at.format("%Y-%m-%d %H:%M UTC")
            ))
            .divider()
            .text("Thank you for your payment.");
        self.persist(
            user.id,
            DocumentType::Receipt,
            &format!("Payment Receipt {}", payment.transaction_reference),
            &content,
            payment.financing_application_id,
            Some(payment.id),
        )
        .await
    }

    /// Generates a KYC approval summary document.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, storage, or the insert fails.
    pub async fn generate_kyc_summary(
        &self,
        user: &users::Model,
        document_count: u64,
        approved_at: DateTime<Utc>,
    ) -> Result<documents::Model, DocumentError> {
        let content = DocumentContent::new("Identity Verification Summary")
            .heading("Client")
            .text(format!("Name: {} {}", user.first_name, user.last_name))
            .text(format!("Client ID: {}", user.client_id))
            .divider()
            .heading("Verification")
            .text(format!("Documents reviewed: {document_count}"))
            .text(format!("Approved on: {}", approved_at.format("%Y-%m-%d")))
            .text("Status: Approved")
            .divider()
            .text("The identity of the client named above has been verified.");
        self.persist(
            user.id,
            DocumentType::KycSummary,
            "Identity Verification Summary",
            &content,
            None,
            None,
        )
        .await
    }

    /// Generates an account statement for an active financing.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, storage, or the insert fails.
    pub async fn generate_statement(
        &self,
        app: &financing_applications::Model,
        user: &users::Model,
        schedule: &[installments::Model],
    ) -> Result<documents::Model, DocumentError> {
        let mut content = DocumentContent::new("Account Statement")
            .text(format!("Reference: {}", app.reference))
            .text(format!(
                "Client: {} {} ({})",
                user.first_name, user.last_name, user.client_id
            ))
            .divider()
            .heading("Repayment Schedule");
        for row in schedule {
            content = content.text(format!(
                "#{} due {}: {} USD, paid {} USD ({})",
                row.sequence, row.due_date, row.amount, row.amount_paid, row.status
            ));
        }
        content = content
            .divider()
            .text(format!("Total repayable: {} USD", app.total_with_fee));
        self.persist(
            user.id,
            DocumentType::Statement,
            &format!("Account Statement {}", app.reference),
            &content,
            Some(app.id),
            None,
        )
        .await
    }

    /// Re-renders an application document with the signature block applied.
    ///
    /// The stored bytes are replaced in place and the verification code is
    /// refreshed to match the new content.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is missing or regeneration fails.
    pub async fn apply_signature(
        &self,
        document_id: Uuid,
        block: SignatureBlock,
    ) -> Result<documents::Model, DocumentError> {
        let doc = documents::Entity::find_by_id(document_id)
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::DocumentNotFound(document_id))?;

        let doc_type = DocumentType::parse(&doc.document_type)
            .ok_or_else(|| DocumentError::Render(format!("unknown type {}", doc.document_type)))?;

        let app_id = doc
            .financing_application_id
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        let app = financing_applications::Entity::find_by_id(app_id)
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        let user = users::Entity::find_by_id(doc.user_id)
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::DocumentNotFound(document_id))?;

        let content = Self::application_content(doc_type, &app, &user, Some(block));
        let pdf = Self::render(&content)?;
        let code = verification_code(&pdf);

        self.storage
            .store(&doc.storage_key, pdf)
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?;

        let mut active: documents::ActiveModel = doc.into();
        active.verification_code = Set(code);
        active.is_signed = Set(true);
        active.updated_at = Set(Utc::now().into());
        active
            .update(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))
    }

    /// Lists a user's documents, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<documents::Model>, DocumentError> {
        documents::Entity::find()
            .filter(documents::Column::UserId.eq(user_id))
            .order_by(documents::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))
    }

    /// Finds a document owned by the given user.
    ///
    /// Unknown ids and other users' documents both come back as not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is missing or the query fails.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<documents::Model, DocumentError> {
        documents::Entity::find_by_id(document_id)
            .filter(documents::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::DocumentNotFound(document_id))
    }

    /// Downloads the PDF bytes of a document owned by the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is missing or storage fails.
    pub async fn download(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<(documents::Model, Vec<u8>), DocumentError> {
        let doc = self.find_for_user(user_id, document_id).await?;
        let bytes = self
            .storage
            .read(&doc.storage_key)
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?;
        Ok((doc, bytes))
    }

    /// Verifies a document by its public verification code.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::VerificationFailed`] when no document
    /// matches the code.
    pub async fn verify_by_code(&self, code: &str) -> Result<VerifiedDocument, DocumentError> {
        let doc = documents::Entity::find()
            .filter(documents::Column::VerificationCode.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::VerificationFailed)?;

        let user = users::Entity::find_by_id(doc.user_id)
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::Database(e.to_string()))?
            .ok_or(DocumentError::VerificationFailed)?;

        Ok(VerifiedDocument {
            document_number: doc.document_number,
            document_type: doc.document_type,
            title: doc.title,
            issued_to: format!("{} {}", user.first_name, user.last_name),
            issued_at: doc.created_at.to_utc(),
            is_signed: doc.is_signed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> users::Model {
        let now = Utc::now().into();
        users::Model {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            password_hash: String::new(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: "client".to_string(),
            client_id: "NDF-000001".to_string(),
            account_number: "NDF1234567890ab".to_string(),
            mfa_enabled: false,
            mfa_secret: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_app(user_id: Uuid) -> financing_applications::Model {
        use rust_decimal_macros::dec;
        let now = Utc::now().into();
        financing_applications::Model {
            id: Uuid::new_v4(),
            user_id,
            reference: "FA-ABCDEF1234".to_string(),
            status: "active".to_string(),
            amount: dec!(6000.00),
            period_months: 12,
            fee_percentage: dec!(4.00),
            fee_amount: dec!(240.00),
            monthly_installment: dec!(500.00),
            total_with_fee: dec!(6240.00),
            purpose: None,
            ack_terms: true,
            ack_fee_non_refundable: true,
            ack_repayment_schedule: true,
            ack_risk_disclosure: true,
            rejection_reason: None,
            submitted_at: None,
            fee_paid_at: None,
            signed_at: None,
            approved_by: None,
            approved_at: None,
            activated_at: None,
            completed_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn certificate_content_carries_terms() {
        let user = sample_user();
        let app = sample_app(user.id);
        let content =
            DocumentService::application_content(DocumentType::Certificate, &app, &user, None);
        assert_eq!(content.title, "Financing Certificate");
        let body: String = content
            .lines
            .iter()
            .filter_map(|l| match l {
                ContentLine::Heading(t) | ContentLine::Text(t) => Some(t.as_str()),
                ContentLine::Divider => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(body.contains("6000.00"));
        assert!(body.contains("500.00"));
        assert!(body.contains("NDF-000001"));
        assert!(content.signature.is_none());
    }

    #[test]
    fn contract_with_signature_block_is_signed() {
        let user = sample_user();
        let app = sample_app(user.id);
        let block = SignatureBlock {
            signature_text: "Jane Doe".to_string(),
            signer_name: "Jane Doe".to_string(),
            signed_at: Utc::now(),
        };
        let content = DocumentService::application_content(
            DocumentType::Contract,
            &app,
            &user,
            Some(block),
        );
        assert!(content.signature.is_some());
    }

    #[test]
    fn every_document_type_renders_under_its_own_title() {
        let user = sample_user();
        let app = sample_app(user.id);
        for (doc_type, title) in [
            (DocumentType::Certificate, "Financing Certificate"),
            (DocumentType::Contract, "Financing Contract"),
            (DocumentType::Receipt, "Payment Receipt"),
            (DocumentType::KycSummary, "Identity Verification Summary"),
            (DocumentType::Statement, "Account Statement"),
        ] {
            let content = DocumentService::application_content(doc_type, &app, &user, None);
            assert_eq!(content.title, title);
        }
    }
}
