//! Payment repository.
//!
//! Persists payment records for both gateways. Settlement is driven by
//! webhooks and is idempotent: replayed events on a closed payment are
//! acknowledged without a second state change.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use novafin_core::payment::{PaymentError, PaymentMethod, PaymentStatus, PaymentType};
use novafin_shared::refs::generate_reference;

use crate::entities::{payments, scheduled_payments};

/// Fields for a new pending payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    pub user_id: Uuid,
    pub financing_application_id: Option<Uuid>,
    pub installment_id: Option<Uuid>,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

/// Result of applying a settlement event.
#[derive(Debug)]
pub struct Settlement {
    pub payment: payments::Model,
    /// False when the event was a replay on an already-closed payment.
    pub changed: bool,
}

/// Payment record repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

fn db_err(e: DbErr) -> PaymentError {
    PaymentError::Database(e.to_string())
}

fn parse_status(s: &str) -> Result<PaymentStatus, PaymentError> {
    PaymentStatus::parse(s)
        .ok_or_else(|| PaymentError::Database(format!("invalid payment status: {s}")))
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a pending payment record before redirecting to checkout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts, or a database
    /// error if the insert fails.
    pub async fn create(&self, input: CreatePaymentInput) -> Result<payments::Model, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount);
        }
        let now = Utc::now();
        payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            financing_application_id: Set(input.financing_application_id),
            installment_id: Set(input.installment_id),
            payment_type: Set(input.payment_type.as_str().to_string()),
            payment_method: Set(input.payment_method.as_str().to_string()),
            amount: Set(input.amount),
            currency: Set(input.currency),
            status: Set(PaymentStatus::Pending.as_str().to_string()),
            transaction_reference: Set(generate_reference("PAY", 12)),
            description: Set(input.description),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Records the card checkout session created for a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is missing or the update fails.
    pub async fn attach_card_session(
        &self,
        payment_id: Uuid,
        session_id: &str,
        payment_intent_id: Option<String>,
    ) -> Result<payments::Model, PaymentError> {
        let payment = self.find(payment_id).await?;
        let mut active: payments::ActiveModel = payment.into();
        active.card_session_id = Set(Some(session_id.to_string()));
        active.card_payment_intent_id = Set(payment_intent_id);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Records the crypto invoice created for a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is missing or the update fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn attach_crypto_invoice(
        &self,
        payment_id: Uuid,
        crypto_payment_id: &str,
        order_id: &str,
        pay_address: Option<String>,
        pay_amount: Option<Decimal>,
        pay_currency: Option<String>,
    ) -> Result<payments::Model, PaymentError> {
        let payment = self.find(payment_id).await?;
        let mut active: payments::ActiveModel = payment.into();
        active.crypto_payment_id = Set(Some(crypto_payment_id.to_string()));
        active.crypto_order_id = Set(Some(order_id.to_string()));
        active.crypto_address = Set(pay_address);
        active.crypto_amount = Set(pay_amount);
        active.crypto_currency = Set(pay_currency);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Finds a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if missing.
    pub async fn find(&self, payment_id: Uuid) -> Result<payments::Model, PaymentError> {
        payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(payment_id))
    }

    /// Finds a payment by card checkout session id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGatewayReference` if no payment matches.
    pub async fn find_by_card_session(
        &self,
        session_id: &str,
    ) -> Result<payments::Model, PaymentError> {
        payments::Entity::find()
            .filter(payments::Column::CardSessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| PaymentError::UnknownGatewayReference(session_id.to_string()))
    }

    /// Finds a payment by card payment-intent id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGatewayReference` if no payment matches.
    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<payments::Model, PaymentError> {
        payments::Entity::find()
            .filter(payments::Column::CardPaymentIntentId.eq(payment_intent_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| PaymentError::UnknownGatewayReference(payment_intent_id.to_string()))
    }

    /// Finds a payment by crypto order id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGatewayReference` if no payment matches.
    pub async fn find_by_crypto_order(
        &self,
        order_id: &str,
    ) -> Result<payments::Model, PaymentError> {
        payments::Entity::find()
            .filter(payments::Column::CryptoOrderId.eq(order_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| PaymentError::UnknownGatewayReference(order_id.to_string()))
    }

    /// Applies a gateway status to a payment.
    ///
    /// Open payments move to the new status. A replayed event that targets
    /// the status the payment already has is acknowledged with
    /// `changed = false`; any other write to a closed payment is rejected.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the payment is closed and the event is
    /// not a replay.
    pub async fn settle(
        &self,
        payment: payments::Model,
        new_status: PaymentStatus,
    ) -> Result<Settlement, PaymentError> {
        let current = parse_status(&payment.status)?;
        if !current.is_open() {
            if current == new_status {
                return Ok(Settlement {
                    payment,
                    changed: false,
                });
            }
            return Err(PaymentError::AlreadyClosed(current));
        }
        if current == new_status {
            return Ok(Settlement {
                payment,
                changed: false,
            });
        }

        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(new_status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(Settlement {
            payment: updated,
            changed: true,
        })
    }

    /// Lists a user's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<payments::Model>, PaymentError> {
        payments::Entity::find()
            .filter(payments::Column::UserId.eq(user_id))
            .order_by(payments::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a payment owned by the given user.
    ///
    /// Unknown ids and other users' payments both come back as not found.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if missing or not owned.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<payments::Model, PaymentError> {
        payments::Entity::find_by_id(payment_id)
            .filter(payments::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(payment_id))
    }

    /// Schedules a future installment payment for reminder purposes.
    ///
    /// The platform never auto-charges; the jobs worker sends a reminder
    /// on the scheduled date instead.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn schedule(
        &self,
        user_id: Uuid,
        installment_id: Uuid,
        scheduled_date: NaiveDate,
        payment_method: PaymentMethod,
    ) -> Result<scheduled_payments::Model, PaymentError> {
        let now = Utc::now();
        scheduled_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            installment_id: Set(installment_id),
            scheduled_date: Set(scheduled_date),
            payment_method: Set(payment_method.as_str().to_string()),
            is_processed: Set(false),
            processed_at: Set(None),
            reminder_sent_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Lists a user's unprocessed scheduled payments, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_scheduled(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<scheduled_payments::Model>, PaymentError> {
        scheduled_payments::Entity::find()
            .filter(scheduled_payments::Column::UserId.eq(user_id))
            .filter(scheduled_payments::Column::IsProcessed.eq(false))
            .order_by(scheduled_payments::Column::ScheduledDate, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Removes an unprocessed scheduled payment owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if missing, not owned, or already
    /// processed.
    pub async fn cancel_scheduled(
        &self,
        user_id: Uuid,
        scheduled_id: Uuid,
    ) -> Result<(), PaymentError> {
        let row = scheduled_payments::Entity::find_by_id(scheduled_id)
            .filter(scheduled_payments::Column::UserId.eq(user_id))
            .filter(scheduled_payments::Column::IsProcessed.eq(false))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(scheduled_id))?;

        scheduled_payments::Entity::delete_by_id(row.id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Marks schedules for an installment processed once it is repaid.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_schedules_processed(
        &self,
        installment_id: Uuid,
    ) -> Result<u64, PaymentError> {
        let now = Utc::now();
        let result = scheduled_payments::Entity::update_many()
            .col_expr(
                scheduled_payments::Column::IsProcessed,
                sea_orm::sea_query::Expr::value(true),
            )
            .col_expr(
                scheduled_payments::Column::ProcessedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .col_expr(
                scheduled_payments::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(scheduled_payments::Column::InstallmentId.eq(installment_id))
            .filter(scheduled_payments::Column::IsProcessed.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}
