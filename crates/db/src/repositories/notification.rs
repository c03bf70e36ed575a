//! Notification dispatcher.
//!
//! Every notification is persisted as an in-app row. Email delivery is
//! best-effort: failures are logged and never propagated to the operation
//! that triggered the notification.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_shared::email::EmailService;

use crate::entities::{notifications, users};

/// A notification to deliver.
#[derive(Debug, Clone)]
pub struct NotificationInput {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub channel: NotificationChannel,
    pub action_url: Option<String>,
}

fn render_html(title: &str, message: &str) -> String {
    format!(
        "<html><body style=\"font-family: sans-serif; color: #1a1a2e;\">\
         <h2>{title}</h2><p>{message}</p>\
         <hr><p style=\"color: #888; font-size: 12px;\">Novafin</p>\
         </body></html>"
    )
}

/// Dispatches notifications in-app and, when requested, by email.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: DatabaseConnection,
    email: Option<EmailService>,
}

impl NotificationDispatcher {
    /// Creates a new dispatcher. Pass `None` to disable email delivery.
    #[must_use]
    pub const fn new(db: DatabaseConnection, email: Option<EmailService>) -> Self {
        Self { db, email }
    }

    /// The configured mail service, if any, for purpose-built emails that
    /// carry more than a notification's title and message.
    #[must_use]
    pub const fn email(&self) -> Option<&EmailService> {
        self.email.as_ref()
    }

    /// Delivers a notification.
    ///
    /// The in-app row is always written. If the channel includes email and
    /// a mail service is configured, the email is sent best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error only if the in-app insert fails.
    pub async fn dispatch(&self, input: NotificationInput) -> Result<notifications::Model, DbErr> {
        let now = Utc::now();
        let row = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            title: Set(input.title.clone()),
            message: Set(input.message.clone()),
            channel: Set(input.channel.as_str().to_string()),
            category: Set(input.category.as_str().to_string()),
            is_read: Set(false),
            read_at: Set(None),
            action_url: Set(input.action_url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        if input.channel.includes_email() {
            if let Some(email) = &self.email {
                match users::Entity::find_by_id(input.user_id).one(&self.db).await {
                    Ok(Some(user)) => {
                        let html = render_html(&input.title, &input.message);
                        // HTML first, plain text if the HTML send fails.
                        let sent = match email
                            .send_html_email(&user.email, &input.title, &html)
                            .await
                        {
                            Ok(()) => Ok(()),
                            Err(_) => {
                                email
                                    .send_email(&user.email, &input.title, &input.message)
                                    .await
                            }
                        };
                        if let Err(e) = sent {
                            tracing::warn!(
                                user_id = %input.user_id,
                                error = %e,
                                "failed to send notification email"
                            );
                        }
                    }
                    Ok(None) => {
                        tracing::warn!(user_id = %input.user_id, "notification user not found");
                    }
                    Err(e) => {
                        tracing::warn!(
                            user_id = %input.user_id,
                            error = %e,
                            "failed to load user for notification email"
                        );
                    }
                }
            }
        }

        Ok(row)
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<notifications::Model>, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by(notifications::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    /// Marks one of the user's notifications as read.
    ///
    /// Unknown ids and other users' notifications are both reported as
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification is missing or the update fails.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), DbErr> {
        let row = notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("notification {notification_id}")))?;

        if row.is_read {
            return Ok(());
        }
        let mut active: notifications::ActiveModel = row.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map(|_| ())
    }

    /// Marks all of a user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let now = Utc::now();
        let result = notifications::Entity::update_many()
            .col_expr(
                notifications::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .col_expr(
                notifications::Column::ReadAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
