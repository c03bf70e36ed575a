//! Signature request repository.
//!
//! Signing captures consent evidence, re-renders the document with the
//! signature block, and advances the financing application once no
//! pending requests remain. Expiry is checked lazily at signing time and
//! a lapsed request is marked expired on the spot; the daily sweep flips
//! the ones nobody touches.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use novafin_core::document::SignatureBlock;
use novafin_core::financing::{ApplicationStatus, FinancingWorkflow};
use novafin_core::signature::{SignatureError, SignatureRequestStatus, check_signable};

use crate::entities::{financing_applications, signature_requests, signatures, users};
use crate::repositories::document::DocumentService;

/// Consent evidence and the typed signature submitted by the client.
#[derive(Debug, Clone)]
pub struct SigningInput {
    pub signature_text: String,
    pub consent_text: String,
    pub ip_address: String,
    pub user_agent: String,
}

/// What happened when a request was signed.
#[derive(Debug)]
pub struct SignArtifacts {
    pub request: signature_requests::Model,
    /// True when signing this request advanced the application to signed.
    pub application_signed: bool,
}

/// Signature request repository.
#[derive(Clone)]
pub struct SignatureRepository {
    db: DatabaseConnection,
    documents: DocumentService,
}

fn db_err(e: DbErr) -> SignatureError {
    SignatureError::Database(e.to_string())
}

fn parse_status(s: &str) -> Result<SignatureRequestStatus, SignatureError> {
    SignatureRequestStatus::parse(s)
        .ok_or_else(|| SignatureError::Database(format!("invalid request status: {s}")))
}

impl SignatureRepository {
    /// Creates a new signature repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, documents: DocumentService) -> Self {
        Self { db, documents }
    }

    /// Lists a user's pending signature requests, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<signature_requests::Model>, SignatureError> {
        signature_requests::Entity::find()
            .filter(signature_requests::Column::UserId.eq(user_id))
            .filter(
                signature_requests::Column::Status.eq(SignatureRequestStatus::Pending.as_str()),
            )
            .order_by(signature_requests::Column::CreatedAt, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Signs a pending request.
    ///
    /// Records the signature with its consent evidence, re-renders the
    /// document with the signature block (best-effort), and advances the
    /// application to signed when this was the last outstanding request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, not signable, or a
    /// write fails.
    pub async fn sign(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        input: SigningInput,
    ) -> Result<SignArtifacts, SignatureError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let request = signature_requests::Entity::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(SignatureError::RequestNotFound(request_id))?;

        let now = Utc::now();
        if let Err(e) = check_signable(
            parse_status(&request.status)?,
            request.expires_at.to_utc(),
            request.user_id,
            user_id,
            &input.consent_text,
            now,
        ) {
            // A lapsed request flips to expired right here, not a day
            // later when the sweep catches it.
            if matches!(e, SignatureError::Expired(_)) {
                let mut active: signature_requests::ActiveModel = request.into();
                active.status = Set(SignatureRequestStatus::Expired.as_str().to_string());
                active.updated_at = Set(now.into());
                active.update(&txn).await.map_err(db_err)?;
                txn.commit().await.map_err(db_err)?;
            }
            return Err(e);
        }

        signatures::ActiveModel {
            id: Set(Uuid::new_v4()),
            signature_request_id: Set(request.id),
            signature_text: Set(input.signature_text.clone()),
            consent_text: Set(input.consent_text),
            ip_address: Set(input.ip_address),
            user_agent: Set(input.user_agent),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let app_id = request.financing_application_id;
        let document_id = request.document_id;
        let mut active: signature_requests::ActiveModel = request.into();
        active.status = Set(SignatureRequestStatus::Signed.as_str().to_string());
        active.signed_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let updated_request = active.update(&txn).await.map_err(db_err)?;

        let remaining = signature_requests::Entity::find()
            .filter(signature_requests::Column::FinancingApplicationId.eq(app_id))
            .filter(
                signature_requests::Column::Status.eq(SignatureRequestStatus::Pending.as_str()),
            )
            .count(&txn)
            .await
            .map_err(db_err)?;

        let mut application_signed = false;
        let app = financing_applications::Entity::find_by_id(app_id)
            .one(&txn)
            .await
            .map_err(db_err)?;
        if let Some(app) = app {
            let status = ApplicationStatus::parse(&app.status)
                .ok_or_else(|| SignatureError::Database(format!("invalid status: {}", app.status)))?;
            match FinancingWorkflow::complete_signing(status, remaining) {
                Ok(Some(action)) => {
                    let mut active: financing_applications::ActiveModel = app.into();
                    active.status = Set(action.new_status().as_str().to_string());
                    active.signed_at = Set(Some(now.into()));
                    active.updated_at = Set(now.into());
                    active.update(&txn).await.map_err(db_err)?;
                    application_signed = true;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(application_id = %app_id, error = %e,
                        "signed request on application not out for signature");
                }
            }
        }

        txn.commit().await.map_err(db_err)?;

        let signer_name = match users::Entity::find_by_id(user_id).one(&self.db).await {
            Ok(Some(user)) => format!("{} {}", user.first_name, user.last_name),
            _ => input.signature_text.clone(),
        };
        let block = SignatureBlock {
            signature_text: input.signature_text,
            signer_name,
            signed_at: now,
        };
        if let Err(e) = self.documents.apply_signature(document_id, block).await {
            tracing::warn!(document_id = %document_id, error = %e,
                "failed to re-render signed document");
        }

        Ok(SignArtifacts {
            request: updated_request,
            application_signed,
        })
    }

    /// Finds a request owned by the given user.
    ///
    /// Unknown ids and other users' requests both come back as not found.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` if missing or not owned.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<signature_requests::Model, SignatureError> {
        signature_requests::Entity::find_by_id(request_id)
            .filter(signature_requests::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(SignatureError::RequestNotFound(request_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use novafin_core::storage::{StorageConfig, StorageProvider, StorageService};

    use super::*;

    fn documents(db: DatabaseConnection) -> DocumentService {
        let provider = StorageProvider::local_fs(std::env::temp_dir().join("novafin-sig-tests"));
        let storage = StorageService::from_config(StorageConfig::new(provider))
            .expect("local fs storage");
        DocumentService::new(db, Arc::new(storage))
    }

    fn pending_request(user_id: Uuid, expires_at: chrono::DateTime<Utc>) -> signature_requests::Model {
        let now = Utc::now();
        signature_requests::Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            financing_application_id: Uuid::new_v4(),
            user_id,
            status: SignatureRequestStatus::Pending.as_str().to_string(),
            expires_at: expires_at.into(),
            signed_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_signing_after_expiry_is_rejected_and_marks_request_expired() {
        let user_id = Uuid::new_v4();
        let request = pending_request(user_id, Utc::now() - Duration::days(1));
        let mut flipped = request.clone();
        flipped.status = SignatureRequestStatus::Expired.as_str().to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request.clone()]])
            .append_query_results([vec![flipped]])
            .into_connection();
        let repo = SignatureRepository::new(db.clone(), documents(db.clone()));

        let err = repo
            .sign(
                user_id,
                request.id,
                SigningInput {
                    signature_text: "Jane Doe".to_string(),
                    consent_text: "I agree to sign electronically".to_string(),
                    ip_address: "203.0.113.9".to_string(),
                    user_agent: "test-agent".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SignatureError::Expired(_)));

        // The rejection must also persist the expired status.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"UPDATE "signature_requests""#));
        assert!(log.contains("expired"));
    }

    #[tokio::test]
    async fn test_signing_someone_elses_request_writes_nothing() {
        let owner = Uuid::new_v4();
        let request = pending_request(owner, Utc::now() + Duration::days(6));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request.clone()]])
            .into_connection();
        let repo = SignatureRepository::new(db.clone(), documents(db.clone()));

        let err = repo
            .sign(
                Uuid::new_v4(),
                request.id,
                SigningInput {
                    signature_text: "Mallory".to_string(),
                    consent_text: "I agree".to_string(),
                    ip_address: "203.0.113.9".to_string(),
                    user_agent: "test-agent".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SignatureError::NotOwner));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(!log.contains("UPDATE"));
    }
}
