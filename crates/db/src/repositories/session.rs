//! Session repository for refresh-token persistence.
//!
//! Refresh tokens are stored as SHA-256 hashes so a database leak never
//! exposes usable tokens.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Session repository for refresh-token lifecycle.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a new session for a freshly issued refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        ttl_days: i64,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<sessions::Model, DbErr> {
        let now = Utc::now();
        sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            refresh_token_hash: Set(hash_token(refresh_token)),
            user_agent: Set(user_agent),
            ip_address: Set(ip_address),
            expires_at: Set((now + Duration::days(ttl_days)).into()),
            revoked_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a live session for the given refresh token.
    ///
    /// Returns `None` if the token is unknown, revoked, or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_valid(&self, refresh_token: &str) -> Result<Option<sessions::Model>, DbErr> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(hash_token(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(session.filter(|s| s.expires_at > Utc::now()))
    }

    /// Revokes a single session by refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), DbErr> {
        let Some(session) = self.find_valid(refresh_token).await? else {
            return Ok(());
        };
        let mut active: sessions::ActiveModel = session.into();
        active.revoked_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map(|_| ())
    }

    /// Revokes all sessions for a user, e.g. after a password change.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::RevokedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_token("some-refresh-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}
