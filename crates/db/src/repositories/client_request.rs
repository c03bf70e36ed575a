//! Client request repository.
//!
//! Clients raise requests against their account or a financing; admins
//! resolve them with a response. Each distinct resolution notifies the
//! client exactly once.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_core::request::{
    ClientRequestError, ClientRequestStatus, ClientRequestType, check_resolvable,
};

use crate::entities::client_requests;
use crate::repositories::notification::{NotificationDispatcher, NotificationInput};

/// Fields for a new client request.
#[derive(Debug, Clone)]
pub struct CreateClientRequestInput {
    pub request_type: String,
    pub financing_application_id: Option<Uuid>,
    pub subject: String,
    pub description: Option<String>,
    pub details: serde_json::Value,
}

/// Client request repository.
#[derive(Clone)]
pub struct ClientRequestRepository {
    db: DatabaseConnection,
    notifier: NotificationDispatcher,
}

fn db_err(e: DbErr) -> ClientRequestError {
    ClientRequestError::Database(e.to_string())
}

impl ClientRequestRepository {
    /// Creates a new client request repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, notifier: NotificationDispatcher) -> Self {
        Self { db, notifier }
    }

    /// Creates a pending request for a user.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an unrecognized request type, or a
    /// database error if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateClientRequestInput,
    ) -> Result<client_requests::Model, ClientRequestError> {
        let request_type = ClientRequestType::parse(&input.request_type)
            .ok_or_else(|| ClientRequestError::UnknownType(input.request_type.clone()))?;

        let now = Utc::now();
        client_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            financing_application_id: Set(input.financing_application_id),
            request_type: Set(request_type.as_str().to_string()),
            status: Set(ClientRequestStatus::Pending.as_str().to_string()),
            subject: Set(input.subject),
            description: Set(input.description),
            details: Set(input.details),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Lists a user's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<client_requests::Model>, ClientRequestError> {
        client_requests::Entity::find()
            .filter(client_requests::Column::UserId.eq(user_id))
            .order_by(client_requests::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
            .map_err(db_err)
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
    ) -> Result<client_requests::Model, ClientRequestError> {
        client_requests::Entity::find_by_id(request_id)
            .filter(client_requests::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ClientRequestError::RequestNotFound(request_id))
    }

    /// Lists open requests for the admin queue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_open(&self) -> Result<Vec<client_requests::Model>, ClientRequestError> {
        client_requests::Entity::find()
            .filter(client_requests::Column::Status.is_in([
                ClientRequestStatus::Pending.as_str(),
                ClientRequestStatus::UnderReview.as_str(),
            ]))
            .order_by(client_requests::Column::CreatedAt, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Resolves an open request with a response.
    ///
    /// The client is notified exactly once per resolution; re-resolving a
    /// closed request is rejected before any write.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, already resolved, the
    /// response is blank, or the update fails.
    pub async fn respond(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
        new_status: ClientRequestStatus,
        response: &str,
    ) -> Result<client_requests::Model, ClientRequestError> {
        let request = client_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ClientRequestError::RequestNotFound(request_id))?;

        let current = ClientRequestStatus::parse(&request.status)
            .ok_or_else(|| ClientRequestError::Database(format!("invalid status: {}", request.status)))?;
        check_resolvable(current, response)?;

        let user_id = request.user_id;
        let subject = request.subject.clone();
        let now = Utc::now();
        let mut active: client_requests::ActiveModel = request.into();
        active.status = Set(new_status.as_str().to_string());
        active.admin_response = Set(Some(response.to_string()));
        active.reviewed_by = Set(Some(reviewer_id));
        active.reviewed_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        let notice = NotificationInput {
            user_id,
            title: format!("Request {new_status}: {subject}"),
            message: response.to_string(),
            category: NotificationCategory::Request,
            channel: NotificationChannel::Both,
            action_url: Some("/dashboard/requests".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e,
                "failed to dispatch request-resolution notification");
        }

        Ok(updated)
    }

    /// Moves a pending request into review without notifying.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, not pending, or the
    /// update fails.
    pub async fn start_review(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<client_requests::Model, ClientRequestError> {
        let request = client_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ClientRequestError::RequestNotFound(request_id))?;

        let current = ClientRequestStatus::parse(&request.status)
            .ok_or_else(|| ClientRequestError::Database(format!("invalid status: {}", request.status)))?;
        if current != ClientRequestStatus::Pending {
            return Err(ClientRequestError::AlreadyResolved(current));
        }

        let mut active: client_requests::ActiveModel = request.into();
        active.status = Set(ClientRequestStatus::UnderReview.as_str().to_string());
        active.reviewed_by = Set(Some(reviewer_id));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }
}
