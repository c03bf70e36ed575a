//! User repository for account creation and profile management.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use novafin_core::auth::UserRole;
use novafin_core::kyc::KycStatus;
use novafin_shared::refs::{format_client_id, generate_account_number, next_client_seq};

use crate::entities::{kyc_applications, user_profiles, users};

/// Profile fields a user may update.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub monthly_income: Option<Decimal>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Creates a new client account.
    ///
    /// Assigns a sequential client id and a random account number exactly
    /// once, and creates the empty profile and draft KYC application rows
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<users::Model, DbErr> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        // Zero-padded ids sort lexically in numeric order, so the highest
        // issued id comes first. A count would reuse ids after deletion.
        let last_issued = users::Entity::find()
            .filter(users::Column::ClientId.like("NDF-%"))
            .order_by(users::Column::ClientId, Order::Desc)
            .one(&txn)
            .await?;
        let seq = next_client_seq(last_issued.as_ref().map(|u| u.client_id.as_str()));

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            role: Set(UserRole::Client.as_str().to_string()),
            client_id: Set(format_client_id(seq)),
            account_number: Set(generate_account_number()),
            mfa_enabled: Set(false),
            mfa_secret: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        user_profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        kyc_applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            status: Set(KycStatus::Draft.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(user)
    }

    /// Gets a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<user_profiles::Model>, DbErr> {
        user_profiles::Entity::find()
            .filter(user_profiles::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Updates a user's profile. Only provided fields change.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is missing or the update fails.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<user_profiles::Model, DbErr> {
        let profile = self
            .get_profile(user_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("profile for user {user_id}")))?;

        let mut active: user_profiles::ActiveModel = profile.into();
        if let Some(v) = input.phone {
            active.phone = Set(Some(v));
        }
        if let Some(v) = input.address_line1 {
            active.address_line1 = Set(Some(v));
        }
        if let Some(v) = input.address_line2 {
            active.address_line2 = Set(Some(v));
        }
        if let Some(v) = input.city {
            active.city = Set(Some(v));
        }
        if let Some(v) = input.country {
            active.country = Set(Some(v));
        }
        if let Some(v) = input.postal_code {
            active.postal_code = Set(Some(v));
        }
        if let Some(v) = input.date_of_birth {
            active.date_of_birth = Set(Some(v));
        }
        if let Some(v) = input.occupation {
            active.occupation = Set(Some(v));
        }
        if let Some(v) = input.employer {
            active.employer = Set(Some(v));
        }
        if let Some(v) = input.monthly_income {
            active.monthly_income = Set(Some(v));
        }
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await
    }

    /// Stores a provisioned MFA secret without enabling MFA yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the update fails.
    pub async fn set_mfa_secret(&self, user_id: Uuid, secret: &str) -> Result<(), DbErr> {
        self.update_mfa(user_id, Some(secret.to_string()), false).await
    }

    /// Enables MFA after a code has been verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the update fails.
    pub async fn enable_mfa(&self, user_id: Uuid) -> Result<(), DbErr> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;
        let secret = user.mfa_secret.clone();
        let mut active: users::ActiveModel = user.into();
        active.mfa_secret = Set(secret);
        active.mfa_enabled = Set(true);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await.map(|_| ())
    }

    /// Disables MFA and clears the stored secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the update fails.
    pub async fn disable_mfa(&self, user_id: Uuid) -> Result<(), DbErr> {
        self.update_mfa(user_id, None, false).await
    }

    async fn update_mfa(
        &self,
        user_id: Uuid,
        secret: Option<String>,
        enabled: bool,
    ) -> Result<(), DbErr> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;
        let mut active: users::ActiveModel = user.into();
        active.mfa_secret = Set(secret);
        active.mfa_enabled = Set(enabled);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await.map(|_| ())
    }
}
