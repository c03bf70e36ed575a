//! Daily maintenance sweeps.
//!
//! Run by the jobs binary: refresh stale installment statuses, send
//! payment reminders, expire lapsed signature requests, and remind about
//! scheduled payments due today. Each sweep is independent and logs its
//! own failures; one failing row never stops the rest.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use novafin_core::financing::{InstallmentStatus, REMINDER_DAYS, sweep_installment_status};
use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_core::signature::SignatureRequestStatus;

use crate::entities::{financing_applications, installments, scheduled_payments, signature_requests};
use crate::repositories::notification::{NotificationDispatcher, NotificationInput};

/// Repository driving the daily sweeps.
#[derive(Clone)]
pub struct SweepRepository {
    db: DatabaseConnection,
    notifier: NotificationDispatcher,
}

impl SweepRepository {
    /// Creates a new sweep repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, notifier: NotificationDispatcher) -> Self {
        Self { db, notifier }
    }

    /// Recomputes statuses of unsettled installments.
    ///
    /// Flips upcoming installments to due on their due date and to
    /// overdue past it. Paid and deferred installments are left alone.
    ///
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or update fails.
    pub async fn refresh_installment_statuses(&self) -> Result<u64, DbErr> {
        let today = Utc::now().date_naive();
        let open = installments::Entity::find()
            .filter(installments::Column::Status.is_not_in([
                InstallmentStatus::Paid.as_str(),
                InstallmentStatus::Deferred.as_str(),
            ]))
            .all(&self.db)
            .await?;

        let mut updated = 0u64;
        for row in open {
            let Some(current) = InstallmentStatus::parse(&row.status) else {
                tracing::warn!(installment_id = %row.id, status = %row.status,
                    "skipping installment with unknown status");
                continue;
            };
            if let Some(next) =
                sweep_installment_status(current, row.due_date, row.amount, row.amount_paid, today)
            {
                let mut active: installments::ActiveModel = row.into();
                active.status = Set(next.as_str().to_string());
                active.updated_at = Set(Utc::now().into());
                active.update(&self.db).await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Sends reminders for installments due in 7, 3, and 1 days.
    ///
    /// Returns the number of reminders dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails. Individual notification
    /// failures are logged and skipped.
    pub async fn send_payment_reminders(&self) -> Result<u64, DbErr> {
        let today = Utc::now().date_naive();
        let mut sent = 0u64;

        for days in REMINDER_DAYS {
            let target = today + Duration::days(days);
            let due_soon = installments::Entity::find()
                .filter(installments::Column::DueDate.eq(target))
                .filter(installments::Column::Status.is_in([
                    InstallmentStatus::Upcoming.as_str(),
                    InstallmentStatus::PartiallyPaid.as_str(),
                ]))
                .all(&self.db)
                .await?;

            for row in due_soon {
                let Some(user_id) = self.owner_of(row.financing_application_id).await? else {
                    continue;
                };
                let outstanding = row.amount - row.amount_paid;
                let notice = NotificationInput {
                    user_id,
                    title: "Upcoming installment".to_string(),
                    message: format!(
                        "Installment #{} of {} USD is due on {} ({days} day(s) from now).",
                        row.sequence, outstanding, row.due_date
                    ),
                    category: NotificationCategory::Payment,
                    channel: NotificationChannel::Both,
                    action_url: Some("/dashboard/payments".to_string()),
                };
                match self.notifier.dispatch(notice).await {
                    Ok(_) => sent += 1,
                    Err(e) => {
                        tracing::warn!(installment_id = %row.id, error = %e,
                            "failed to dispatch payment reminder");
                    }
                }
            }
        }
        Ok(sent)
    }

    /// Expires pending signature requests past their window.
    ///
    /// Returns the number of requests expired.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or update fails.
    pub async fn expire_signature_requests(&self) -> Result<u64, DbErr> {
        let now = Utc::now();
        let lapsed = signature_requests::Entity::find()
            .filter(
                signature_requests::Column::Status.eq(SignatureRequestStatus::Pending.as_str()),
            )
            .filter(signature_requests::Column::ExpiresAt.lt(now))
            .all(&self.db)
            .await?;

        let mut expired = 0u64;
        for row in lapsed {
            let user_id = row.user_id;
            let mut active: signature_requests::ActiveModel = row.into();
            active.status = Set(SignatureRequestStatus::Expired.as_str().to_string());
            active.updated_at = Set(now.into());
            active.update(&self.db).await?;
            expired += 1;

            let notice = NotificationInput {
                user_id,
                title: "Signature request expired".to_string(),
                message: "A document signature request has expired. Please contact support \
                          to continue your application."
                    .to_string(),
                category: NotificationCategory::Signature,
                channel: NotificationChannel::Both,
                action_url: Some("/dashboard/signatures".to_string()),
            };
            if let Err(e) = self.notifier.dispatch(notice).await {
                tracing::warn!(user_id = %user_id, error = %e,
                    "failed to dispatch expiry notification");
            }
        }
        Ok(expired)
    }

    /// Reminds clients about scheduled payments due today.
    ///
    /// Each schedule row is stamped after its reminder so a rerun of the
    /// sweep never reminds twice.
    ///
    /// Returns the number of reminders dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or update fails.
    pub async fn send_scheduled_payment_reminders(&self) -> Result<u64, DbErr> {
        let today = Utc::now().date_naive();
        let due = scheduled_payments::Entity::find()
            .filter(scheduled_payments::Column::ScheduledDate.eq(today))
            .filter(scheduled_payments::Column::IsProcessed.eq(false))
            .filter(scheduled_payments::Column::ReminderSentAt.is_null())
            .all(&self.db)
            .await?;

        let mut sent = 0u64;
        for row in due {
            let user_id = row.user_id;
            let notice = NotificationInput {
                user_id,
                title: "Scheduled payment today".to_string(),
                message: format!(
                    "Your scheduled {} payment is due today.",
                    row.payment_method
                ),
                category: NotificationCategory::Payment,
                channel: NotificationChannel::Both,
                action_url: Some("/dashboard/payments".to_string()),
            };
            if let Err(e) = self.notifier.dispatch(notice).await {
                tracing::warn!(user_id = %user_id, error = %e,
                    "failed to dispatch scheduled-payment reminder");
                continue;
            }

            let mut active: scheduled_payments::ActiveModel = row.into();
            active.reminder_sent_at = Set(Some(Utc::now().into()));
            active.updated_at = Set(Utc::now().into());
            active.update(&self.db).await?;
            sent += 1;
        }
        Ok(sent)
    }

    async fn owner_of(&self, application_id: Uuid) -> Result<Option<Uuid>, DbErr> {
        Ok(financing_applications::Entity::find_by_id(application_id)
            .one(&self.db)
            .await?
            .map(|app| app.user_id))
    }
}
