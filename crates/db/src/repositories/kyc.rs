//! KYC repository.
//!
//! Orchestrates the identity-verification lifecycle: document uploads into
//! object storage, submission, and admin review. Status guards come from
//! the core crate; this layer only reads, checks, and writes.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use novafin_core::kyc::{KycDocumentType, KycError, KycStatus, KycWorkflow};
use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_core::storage::StorageService;

use crate::entities::{kyc_applications, kyc_documents, users};
use crate::repositories::document::DocumentService;
use crate::repositories::notification::{NotificationDispatcher, NotificationInput};

/// A KYC document upload.
#[derive(Debug, Clone)]
pub struct UploadKycDocumentInput {
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub notes: Option<String>,
}

/// KYC application repository.
#[derive(Clone)]
pub struct KycRepository {
    db: DatabaseConnection,
    storage: Arc<StorageService>,
    documents: DocumentService,
    notifier: NotificationDispatcher,
}

fn db_err(e: DbErr) -> KycError {
    KycError::Database(e.to_string())
}

impl KycRepository {
    /// Creates a new KYC repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<StorageService>,
        documents: DocumentService,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            storage,
            documents,
            notifier,
        }
    }

    /// Gets the user's KYC application, creating a draft one if missing.
    ///
    /// Registration normally creates the draft; this covers accounts that
    /// predate that behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or insert fails.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<kyc_applications::Model, KycError> {
        if let Some(app) = kyc_applications::Entity::find()
            .filter(kyc_applications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
        {
            return Ok(app);
        }
        let now = Utc::now();
        kyc_applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            status: Set(KycStatus::Draft.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Lists the documents uploaded to the user's application.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_documents(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<kyc_documents::Model>, KycError> {
        let app = self.get_or_create(user_id).await?;
        kyc_documents::Entity::find()
            .filter(kyc_documents::Column::KycApplicationId.eq(app.id))
            .order_by(kyc_documents::Column::CreatedAt, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Uploads a document to the user's draft application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not editable, the file fails
    /// validation, or storage or the insert fails.
    pub async fn upload_document(
        &self,
        user_id: Uuid,
        input: UploadKycDocumentInput,
    ) -> Result<kyc_documents::Model, KycError> {
        let doc_type = KycDocumentType::parse(&input.document_type)
            .ok_or_else(|| KycError::UnknownDocumentType(input.document_type.clone()))?;

        let app = self.get_or_create(user_id).await?;
        let status = parse_status(&app.status)?;
        if !status.is_editable() {
            return Err(KycError::InvalidTransition {
                from: status,
                to: KycStatus::Draft,
            });
        }

        let size = input.bytes.len() as u64;
        self.storage
            .validate_upload(&input.content_type, size)
            .map_err(|e| KycError::Storage(e.to_string()))?;

        let id = Uuid::new_v4();
        let key = StorageService::kyc_key(user_id, id, &input.file_name);
        self.storage
            .store(&key, input.bytes)
            .await
            .map_err(|e| KycError::Storage(e.to_string()))?;

        let now = Utc::now();
        kyc_documents::ActiveModel {
            id: Set(id),
            kyc_application_id: Set(app.id),
            document_type: Set(doc_type.as_str().to_string()),
            storage_key: Set(key),
            file_name: Set(input.file_name),
            file_size: Set(i64::try_from(size).unwrap_or(i64::MAX)),
            content_type: Set(input.content_type),
            is_verified: Set(false),
            notes: Set(input.notes),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Submits the user's application for review.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or the update
    /// fails.
    pub async fn submit(&self, user_id: Uuid) -> Result<kyc_applications::Model, KycError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let app = kyc_applications::Entity::find()
            .filter(kyc_applications::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(KycError::DocumentsRequired)?;

        let status = parse_status(&app.status)?;
        let document_count = kyc_documents::Entity::find()
            .filter(kyc_documents::Column::KycApplicationId.eq(app.id))
            .count(&txn)
            .await
            .map_err(db_err)?;

        let next = KycWorkflow::submit(status, document_count)?;

        let now = Utc::now();
        let mut active: kyc_applications::ActiveModel = app.into();
        active.status = Set(next.as_str().to_string());
        active.rejection_reason = Set(None);
        active.submitted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Lists applications awaiting review, oldest submission first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<kyc_applications::Model>, KycError> {
        kyc_applications::Entity::find()
            .filter(kyc_applications::Column::Status.is_in([
                KycStatus::Submitted.as_str(),
                KycStatus::UnderReview.as_str(),
            ]))
            .order_by(kyc_applications::Column::SubmittedAt, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Moves a submitted application into review.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or the update
    /// fails.
    pub async fn start_review(
        &self,
        application_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<kyc_applications::Model, KycError> {
        let app = self.find(application_id).await?;
        let next = KycWorkflow::start_review(parse_status(&app.status)?)?;

        let now = Utc::now();
        let mut active: kyc_applications::ActiveModel = app.into();
        active.status = Set(next.as_str().to_string());
        active.reviewed_by = Set(Some(reviewer_id));
        active.updated_at = Set(now.into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Approves an application.
    ///
    /// Generates the verification summary document and notifies the client;
    /// both are best-effort and never fail the approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or the update
    /// fails.
    pub async fn approve(
        &self,
        application_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<kyc_applications::Model, KycError> {
        let app = self.find(application_id).await?;
        let next = KycWorkflow::approve(parse_status(&app.status)?)?;
        let user_id = app.user_id;
        let app_id = app.id;

        let document_count = kyc_documents::Entity::find()
            .filter(kyc_documents::Column::KycApplicationId.eq(app_id))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let now = Utc::now();
        let mut active: kyc_applications::ActiveModel = app.into();
        active.status = Set(next.as_str().to_string());
        active.reviewed_by = Set(Some(reviewer_id));
        active.reviewed_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let mut updated = active.update(&self.db).await.map_err(db_err)?;

        if let Some(user) = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        {
            match self
                .documents
                .generate_kyc_summary(&user, document_count, now)
                .await
            {
                Ok(doc) => {
                    let mut active: kyc_applications::ActiveModel = updated.into();
                    active.summary_document_id = Set(Some(doc.id));
                    updated = active.update(&self.db).await.map_err(db_err)?;
                }
                Err(e) => {
                    tracing::warn!(application_id = %app_id, error = %e,
                        "failed to generate KYC summary document");
                }
            }
        }

        let notice = NotificationInput {
            user_id,
            title: "Identity verification approved".to_string(),
            message: "Your identity has been verified. You can now apply for financing."
                .to_string(),
            category: NotificationCategory::Kyc,
            channel: NotificationChannel::Both,
            action_url: Some("/dashboard/financing".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to dispatch KYC notification");
        }

        Ok(updated)
    }

    /// Rejects an application with a reason and notifies the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or the update
    /// fails.
    pub async fn reject(
        &self,
        application_id: Uuid,
        reviewer_id: Uuid,
        reason: &str,
    ) -> Result<kyc_applications::Model, KycError> {
        let app = self.find(application_id).await?;
        let next = KycWorkflow::reject(parse_status(&app.status)?, reason)?;
        let user_id = app.user_id;

        let now = Utc::now();
        let mut active: kyc_applications::ActiveModel = app.into();
        active.status = Set(next.as_str().to_string());
        active.rejection_reason = Set(Some(reason.to_string()));
        active.reviewed_by = Set(Some(reviewer_id));
        active.reviewed_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        let notice = NotificationInput {
            user_id,
            title: "Identity verification needs attention".to_string(),
            message: format!("Your verification was not approved: {reason}"),
            category: NotificationCategory::Kyc,
            channel: NotificationChannel::Both,
            action_url: Some("/dashboard/kyc".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to dispatch KYC notification");
        }

        Ok(updated)
    }

    /// Returns the user's current KYC status, treating a missing
    /// application as draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn status_for_user(&self, user_id: Uuid) -> Result<KycStatus, KycError> {
        let app = kyc_applications::Entity::find()
            .filter(kyc_applications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        match app {
            Some(app) => parse_status(&app.status),
            None => Ok(KycStatus::Draft),
        }
    }

    async fn find(&self, application_id: Uuid) -> Result<kyc_applications::Model, KycError> {
        kyc_applications::Entity::find_by_id(application_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(KycError::ApplicationNotFound(application_id))
    }
}

fn parse_status(s: &str) -> Result<KycStatus, KycError> {
    KycStatus::parse(s).ok_or_else(|| KycError::Database(format!("invalid KYC status: {s}")))
}
