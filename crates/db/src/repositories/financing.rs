//! Financing application repository.
//!
//! Orchestrates the application lifecycle. Every transition follows the
//! same shape: read the row, parse its status, run the core guard, and
//! apply the returned action inside a transaction. Document generation
//! and notifications are side effects that never fail a transition.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use novafin_core::financing::{
    Acknowledgments, ApplicationAction, ApplicationStatus, FinancingError, FinancingWorkflow,
    InstallmentStatus, apply_payment, calculate_quote, generate_schedule,
};
use novafin_core::kyc::KycStatus;
use novafin_core::notification::{NotificationCategory, NotificationChannel};
use novafin_core::signature::{SignatureRequestStatus, expiry_from};
use novafin_shared::refs::generate_reference;

use crate::entities::{
    financing_applications, installments, kyc_applications, signature_requests, users,
};
use crate::repositories::document::DocumentService;
use crate::repositories::notification::{NotificationDispatcher, NotificationInput};

/// Fields for a new draft application.
#[derive(Debug, Clone)]
pub struct CreateApplicationInput {
    pub amount: Decimal,
    pub period_months: u32,
    pub fee_percentage: Decimal,
    pub purpose: Option<String>,
    pub acknowledgments: Acknowledgments,
}

/// Fields a client may change while the application is in draft.
#[derive(Debug, Clone, Default)]
pub struct UpdateApplicationInput {
    pub amount: Option<Decimal>,
    pub period_months: Option<u32>,
    pub purpose: Option<String>,
    pub acknowledgments: Option<Acknowledgments>,
}

/// Financing application repository.
#[derive(Clone)]
pub struct FinancingRepository {
    db: DatabaseConnection,
    documents: DocumentService,
    notifier: NotificationDispatcher,
}

fn db_err(e: DbErr) -> FinancingError {
    FinancingError::Database(e.to_string())
}

fn parse_status(s: &str) -> Result<ApplicationStatus, FinancingError> {
    ApplicationStatus::parse(s)
        .ok_or_else(|| FinancingError::Database(format!("invalid application status: {s}")))
}

fn parse_period(period_months: i32) -> Result<u32, FinancingError> {
    u32::try_from(period_months)
        .map_err(|_| FinancingError::Database(format!("invalid period: {period_months}")))
}

fn acks_of(app: &financing_applications::Model) -> Acknowledgments {
    Acknowledgments {
        terms: app.ack_terms,
        fee_non_refundable: app.ack_fee_non_refundable,
        repayment_schedule: app.ack_repayment_schedule,
        risk_disclosure: app.ack_risk_disclosure,
    }
}

fn apply_action(active: &mut financing_applications::ActiveModel, action: &ApplicationAction) {
    active.status = Set(action.new_status().as_str().to_string());
    match action {
        ApplicationAction::Submit { submitted_at, .. } => {
            active.submitted_at = Set(Some((*submitted_at).into()));
        }
        ApplicationAction::ConfirmFee { fee_paid_at, .. } => {
            active.fee_paid_at = Set(Some((*fee_paid_at).into()));
        }
        ApplicationAction::CompleteSigning { signed_at, .. } => {
            active.signed_at = Set(Some((*signed_at).into()));
        }
        ApplicationAction::Approve {
            approved_by,
            approved_at,
            ..
        } => {
            active.approved_by = Set(Some(*approved_by));
            active.approved_at = Set(Some((*approved_at).into()));
        }
        ApplicationAction::Activate { activated_at, .. } => {
            active.activated_at = Set(Some((*activated_at).into()));
        }
        ApplicationAction::Reject {
            rejected_by,
            rejection_reason,
            ..
        } => {
            active.approved_by = Set(Some(*rejected_by));
            active.rejection_reason = Set(Some(rejection_reason.clone()));
        }
        ApplicationAction::Complete { completed_at, .. } => {
            active.completed_at = Set(Some((*completed_at).into()));
        }
        ApplicationAction::Cancel { cancelled_by, .. } => {
            active.cancelled_by = Set(Some(*cancelled_by));
        }
        ApplicationAction::BeginSigning { .. } | ApplicationAction::StartReview { .. } => {}
    }
    active.updated_at = Set(Utc::now().into());
}

impl FinancingRepository {
    /// Creates a new financing repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        documents: DocumentService,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            documents,
            notifier,
        }
    }

    /// Creates a draft application with computed terms.
    ///
    /// # Errors
    ///
    /// Returns an error if the terms are invalid or the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateApplicationInput,
    ) -> Result<financing_applications::Model, FinancingError> {
        let quote = calculate_quote(input.amount, input.period_months, input.fee_percentage)?;
        let period = i32::try_from(input.period_months)
            .map_err(|_| FinancingError::InvalidPeriod { max: 120 })?;

        let now = Utc::now();
        financing_applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            reference: Set(generate_reference("FA", 10)),
            status: Set(ApplicationStatus::Draft.as_str().to_string()),
            amount: Set(quote.amount),
            period_months: Set(period),
            fee_percentage: Set(quote.fee_percentage),
            fee_amount: Set(quote.fee_amount),
            monthly_installment: Set(quote.monthly_installment),
            total_with_fee: Set(quote.total_with_fee),
            purpose: Set(input.purpose),
            ack_terms: Set(input.acknowledgments.terms),
            ack_fee_non_refundable: Set(input.acknowledgments.fee_non_refundable),
            ack_repayment_schedule: Set(input.acknowledgments.repayment_schedule),
            ack_risk_disclosure: Set(input.acknowledgments.risk_disclosure),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)
    }

    /// Updates a draft application. Terms are recomputed when the amount
    /// or period changes.
    ///
    /// # Errors
    ///
    /// Returns `TermsLocked` once the application has left draft.
    pub async fn update(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        input: UpdateApplicationInput,
    ) -> Result<financing_applications::Model, FinancingError> {
        let app = self.find_for_user(user_id, application_id).await?;
        let status = parse_status(&app.status)?;
        if status != ApplicationStatus::Draft {
            return Err(FinancingError::TermsLocked(status));
        }

        let amount = input.amount.unwrap_or(app.amount);
        let period = match input.period_months {
            Some(p) => p,
            None => parse_period(app.period_months)?,
        };
        let quote = calculate_quote(amount, period, app.fee_percentage)?;

        let mut active: financing_applications::ActiveModel = app.into();
        active.amount = Set(quote.amount);
        active.period_months = Set(i32::try_from(period)
            .map_err(|_| FinancingError::InvalidPeriod { max: 120 })?);
        active.fee_amount = Set(quote.fee_amount);
        active.monthly_installment = Set(quote.monthly_installment);
        active.total_with_fee = Set(quote.total_with_fee);
        if let Some(purpose) = input.purpose {
            active.purpose = Set(Some(purpose));
        }
        if let Some(acks) = input.acknowledgments {
            active.ack_terms = Set(acks.terms);
            active.ack_fee_non_refundable = Set(acks.fee_non_refundable);
            active.ack_repayment_schedule = Set(acks.repayment_schedule);
            active.ack_risk_disclosure = Set(acks.risk_disclosure);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Submits a draft application, making the fee payable.
    ///
    /// # Errors
    ///
    /// Returns an error if KYC is not approved, an acknowledgment is
    /// missing, or the guard rejects the transition.
    pub async fn submit(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let app = financing_applications::Entity::find_by_id(application_id)
            .filter(financing_applications::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(application_id))?;

        let kyc_status = kyc_applications::Entity::find()
            .filter(kyc_applications::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(db_err)?
            .and_then(|k| KycStatus::parse(&k.status))
            .unwrap_or(KycStatus::Draft);

        let action = FinancingWorkflow::submit(parse_status(&app.status)?, kyc_status, acks_of(&app))?;

        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Records a confirmed fee payment from a gateway webhook.
    ///
    /// Moves the application to fee-paid, then generates the certificate
    /// and contract, opens one signature request per document, and puts
    /// the application out for signature. Document generation failures
    /// leave the application at fee-paid for a later retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or the update
    /// fails.
    pub async fn confirm_fee(
        &self,
        application_id: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let app = financing_applications::Entity::find_by_id(application_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(application_id))?;

        let action = FinancingWorkflow::confirm_fee(parse_status(&app.status)?)?;
        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        match self.open_signing(updated.clone()).await {
            Ok(app) => Ok(app),
            Err(e) => {
                tracing::error!(application_id = %application_id, error = %e,
                    "failed to open signing, application stays fee-paid");
                Ok(updated)
            }
        }
    }

    /// Generates the signing documents and moves a fee-paid application
    /// out for signature.
    ///
    /// # Errors
    ///
    /// Returns an error if document generation or any insert fails.
    async fn open_signing(
        &self,
        app: financing_applications::Model,
    ) -> Result<financing_applications::Model, FinancingError> {
        let user = users::Entity::find_by_id(app.user_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(app.id))?;

        let certificate = self
            .documents
            .generate_certificate(&app, &user)
            .await
            .map_err(|e| FinancingError::Database(e.to_string()))?;
        let contract = self
            .documents
            .generate_contract(&app, &user)
            .await
            .map_err(|e| FinancingError::Database(e.to_string()))?;

        let action = FinancingWorkflow::begin_signing(parse_status(&app.status)?)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();
        let expires_at = expiry_from(now);
        for doc in [&certificate, &contract] {
            signature_requests::ActiveModel {
                id: Set(Uuid::new_v4()),
                document_id: Set(doc.id),
                financing_application_id: Set(app.id),
                user_id: Set(app.user_id),
                status: Set(SignatureRequestStatus::Pending.as_str().to_string()),
                expires_at: Set(expires_at.into()),
                signed_at: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        let reference = app.reference.clone();
        let user_id = app.user_id;
        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        // The dedicated email below carries the signing link, so the
        // notification itself stays in-app only.
        let notice = NotificationInput {
            user_id,
            title: "Documents ready for signing".to_string(),
            message: format!(
                "Your documents for application {reference} are ready. Please sign within 7 days."
            ),
            category: NotificationCategory::Signature,
            channel: NotificationChannel::InApp,
            action_url: Some("/dashboard/signatures".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to dispatch signing notification");
        }

        if let Some(email) = self.notifier.email() {
            let name = format!("{} {}", user.first_name, user.last_name);
            if let Err(e) = email
                .send_signing_ready_email(&user.email, &name, &reference)
                .await
            {
                tracing::warn!(user_id = %user_id, error = %e, "failed to send signing email");
            }
        }

        Ok(updated)
    }

    /// Stages a signed application for review.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition.
    pub async fn start_review(
        &self,
        application_id: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        let app = self.find(application_id).await?;
        let action = FinancingWorkflow::start_review(parse_status(&app.status)?)?;
        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        active.update(&self.db).await.map_err(db_err)
    }

    /// Approves an application and activates it immediately.
    ///
    /// Any previously generated schedule is replaced; installment due
    /// dates count 30-day periods from activation. The certificate,
    /// contract, and account statement are regenerated best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition or a write
    /// fails.
    pub async fn approve(
        &self,
        application_id: Uuid,
        approved_by: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let app = financing_applications::Entity::find_by_id(application_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(application_id))?;

        let approve = FinancingWorkflow::approve(parse_status(&app.status)?, approved_by)?;
        let activate = FinancingWorkflow::activate(approve.new_status())?;
        let activated_at = match &activate {
            ApplicationAction::Activate { activated_at, .. } => *activated_at,
            _ => Utc::now(),
        };

        let plans = generate_schedule(app.amount, parse_period(app.period_months)?, activated_at)?;

        installments::Entity::delete_many()
            .filter(installments::Column::FinancingApplicationId.eq(app.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let now = Utc::now();
        for plan in &plans {
            installments::ActiveModel {
                id: Set(Uuid::new_v4()),
                financing_application_id: Set(app.id),
                sequence: Set(i32::try_from(plan.sequence).unwrap_or(i32::MAX)),
                amount: Set(plan.amount),
                amount_paid: Set(Decimal::ZERO),
                due_date: Set(plan.due_date),
                status: Set(InstallmentStatus::Upcoming.as_str().to_string()),
                paid_at: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        let user_id = app.user_id;
        let reference = app.reference.clone();
        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &approve);
        apply_action(&mut active, &activate);
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        if let Ok(Some(user)) = users::Entity::find_by_id(user_id).one(&self.db).await {
            // Certificate and contract carry the final terms, so both are
            // reissued against the activated application.
            if let Err(e) = self.documents.generate_certificate(&updated, &user).await {
                tracing::warn!(application_id = %application_id, error = %e,
                    "failed to regenerate certificate");
            }
            if let Err(e) = self.documents.generate_contract(&updated, &user).await {
                tracing::warn!(application_id = %application_id, error = %e,
                    "failed to regenerate contract");
            }
            let schedule = self.list_installments(application_id).await.unwrap_or_default();
            if let Err(e) = self
                .documents
                .generate_statement(&updated, &user, &schedule)
                .await
            {
                tracing::warn!(application_id = %application_id, error = %e,
                    "failed to generate account statement");
            }
        }

        let notice = NotificationInput {
            user_id,
            title: "Financing approved".to_string(),
            message: format!("Your application {reference} has been approved and is now active."),
            category: NotificationCategory::Financing,
            channel: NotificationChannel::Both,
            action_url: Some("/dashboard/financing".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to dispatch approval notification");
        }

        Ok(updated)
    }

    /// Rejects an application with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard rejects the transition.
    pub async fn reject(
        &self,
        application_id: Uuid,
        rejected_by: Uuid,
        reason: &str,
    ) -> Result<financing_applications::Model, FinancingError> {
        let app = self.find(application_id).await?;
        let action =
            FinancingWorkflow::reject(parse_status(&app.status)?, rejected_by, reason.to_string())?;
        let user_id = app.user_id;
        let reference = app.reference.clone();

        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        let updated = active.update(&self.db).await.map_err(db_err)?;

        let notice = NotificationInput {
            user_id,
            title: "Financing application update".to_string(),
            message: format!("Your application {reference} was not approved: {reason}"),
            category: NotificationCategory::Financing,
            channel: NotificationChannel::Both,
            action_url: Some("/dashboard/financing".to_string()),
        };
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to dispatch rejection notification");
        }

        Ok(updated)
    }

    /// Cancels any non-terminal application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is already terminal.
    pub async fn cancel(
        &self,
        application_id: Uuid,
        cancelled_by: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        let app = self.find(application_id).await?;
        let action = FinancingWorkflow::cancel(parse_status(&app.status)?, cancelled_by)?;
        let mut active: financing_applications::ActiveModel = app.into();
        apply_action(&mut active, &action);
        active.update(&self.db).await.map_err(db_err)
    }

    /// Applies a settled payment to an installment.
    ///
    /// Overpayment is clamped. When the last installment settles, the
    /// application completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the installment is missing or a write fails.
    pub async fn apply_installment_payment(
        &self,
        installment_id: Uuid,
        payment_amount: Decimal,
    ) -> Result<installments::Model, FinancingError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let installment = installments::Entity::find_by_id(installment_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::InstallmentNotFound(installment_id))?;

        let today = Utc::now().date_naive();
        let application = apply_payment(
            installment.due_date,
            installment.amount,
            installment.amount_paid,
            payment_amount,
            today,
        )?;

        let app_id = installment.financing_application_id;
        let settled = application.settled;
        let mut active: installments::ActiveModel = installment.into();
        active.amount_paid = Set(application.amount_paid);
        active.status = Set(application.status.as_str().to_string());
        if settled {
            active.paid_at = Set(Some(Utc::now().into()));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        if settled {
            let outstanding = installments::Entity::find()
                .filter(installments::Column::FinancingApplicationId.eq(app_id))
                .filter(
                    installments::Column::Status.ne(InstallmentStatus::Paid.as_str()),
                )
                .count(&txn)
                .await
                .map_err(db_err)?;

            if outstanding == 0 {
                let app = financing_applications::Entity::find_by_id(app_id)
                    .one(&txn)
                    .await
                    .map_err(db_err)?
                    .ok_or(FinancingError::ApplicationNotFound(app_id))?;
                let action = FinancingWorkflow::complete(parse_status(&app.status)?)?;
                let user_id = app.user_id;
                let reference = app.reference.clone();
                let mut active: financing_applications::ActiveModel = app.into();
                apply_action(&mut active, &action);
                active.update(&txn).await.map_err(db_err)?;

                txn.commit().await.map_err(db_err)?;

                let notice = NotificationInput {
                    user_id,
                    title: "Financing repaid in full".to_string(),
                    message: format!("Your financing {reference} is fully repaid. Thank you!"),
                    category: NotificationCategory::Financing,
                    channel: NotificationChannel::Both,
                    action_url: Some("/dashboard/financing".to_string()),
                };
                if let Err(e) = self.notifier.dispatch(notice).await {
                    tracing::warn!(user_id = %user_id, error = %e,
                        "failed to dispatch completion notification");
                }
                return Ok(updated);
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Finds an application by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationNotFound` if missing.
    pub async fn find(
        &self,
        application_id: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        financing_applications::Entity::find_by_id(application_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(application_id))
    }

    /// Finds an application owned by the given user.
    ///
    /// Unknown ids and other users' applications both come back as not
    /// found.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationNotFound` if missing or not owned.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<financing_applications::Model, FinancingError> {
        financing_applications::Entity::find_by_id(application_id)
            .filter(financing_applications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::ApplicationNotFound(application_id))
    }

    /// Lists a user's applications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<financing_applications::Model>, FinancingError> {
        financing_applications::Entity::find()
            .filter(financing_applications::Column::UserId.eq(user_id))
            .order_by(financing_applications::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists all applications for the admin dashboard, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<financing_applications::Model>, FinancingError> {
        financing_applications::Entity::find()
            .order_by(financing_applications::Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists an application's installments in sequence order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_installments(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<installments::Model>, FinancingError> {
        installments::Entity::find()
            .filter(installments::Column::FinancingApplicationId.eq(application_id))
            .order_by(installments::Column::Sequence, Order::Asc)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds an installment by ID.
    ///
    /// # Errors
    ///
    /// Returns `InstallmentNotFound` if missing.
    pub async fn find_installment(
        &self,
        installment_id: Uuid,
    ) -> Result<installments::Model, FinancingError> {
        installments::Entity::find_by_id(installment_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FinancingError::InstallmentNotFound(installment_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use novafin_core::storage::{StorageConfig, StorageProvider, StorageService};

    use super::*;

    fn documents(db: DatabaseConnection) -> DocumentService {
        let provider = StorageProvider::local_fs(std::env::temp_dir().join("novafin-fin-tests"));
        let storage = StorageService::from_config(StorageConfig::new(provider))
            .expect("local fs storage");
        DocumentService::new(db, Arc::new(storage))
    }

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
            account_number: "NDF1234567890AB".to_string(),
            mfa_enabled: false,
            mfa_secret: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_app(user_id: Uuid, status: &str) -> financing_applications::Model {
        let now = Utc::now().into();
        financing_applications::Model {
            id: Uuid::new_v4(),
            user_id,
            reference: "FA-ABCDEF1234".to_string(),
            status: status.to_string(),
            amount: dec!(3000.00),
            period_months: 3,
            fee_percentage: dec!(4.00),
            fee_amount: dec!(120.00),
            monthly_installment: dec!(1000.00),
            total_with_fee: dec!(3120.00),
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

    fn sample_installment(application_id: Uuid, sequence: i32) -> installments::Model {
        let now = Utc::now();
        installments::Model {
            id: Uuid::new_v4(),
            financing_application_id: application_id,
            sequence,
            amount: dec!(1000.00),
            amount_paid: Decimal::ZERO,
            due_date: now.date_naive(),
            status: "upcoming".to_string(),
            paid_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn sample_document(user_id: Uuid, doc_type: &str) -> crate::entities::documents::Model {
        let now = Utc::now().into();
        crate::entities::documents::Model {
            id: Uuid::new_v4(),
            user_id,
            financing_application_id: None,
            payment_id: None,
            document_type: doc_type.to_string(),
            document_number: format!("{}-TEST", doc_type.to_uppercase()),
            title: doc_type.to_string(),
            storage_key: "documents/test.pdf".to_string(),
            verification_code: "00".repeat(32),
            is_signed: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_notification(user_id: Uuid) -> crate::entities::notifications::Model {
        let now = Utc::now().into();
        crate::entities::notifications::Model {
            id: Uuid::new_v4(),
            user_id,
            title: "Financing approved".to_string(),
            message: String::new(),
            channel: "both".to_string(),
            category: "financing".to_string(),
            is_read: false,
            read_at: None,
            action_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_approve_reissues_certificate_and_contract() {
        let user = sample_user();
        let signed = sample_app(user.id, "signed");
        let mut activated = signed.clone();
        activated.status = "active".to_string();
        let app_id = signed.id;
        let installment_rows =
            vec![sample_installment(app_id, 1), sample_installment(app_id, 2), sample_installment(app_id, 3)];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![signed]])
            .append_query_results([
                vec![installment_rows[0].clone()],
                vec![installment_rows[1].clone()],
                vec![installment_rows[2].clone()],
            ])
            .append_query_results([vec![activated]])
            .append_query_results([vec![user.clone()]])
            .append_query_results([
                vec![sample_document(user.id, "certificate")],
                vec![sample_document(user.id, "contract")],
            ])
            .append_query_results([installment_rows.clone()])
            .append_query_results([vec![sample_document(user.id, "statement")]])
            .append_query_results([vec![sample_notification(user.id)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = FinancingRepository::new(
            db.clone(),
            documents(db.clone()),
            NotificationDispatcher::new(db.clone(), None),
        );

        let result = repo.approve(app_id, Uuid::new_v4()).await.expect("approve");
        assert_eq!(result.status, "active");

        // Both signing documents are reissued against the activated terms.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"INSERT INTO "documents""#));
        assert!(log.contains("certificate"));
        assert!(log.contains("contract"));
    }
}
