//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned download URL.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type, if the backend records one.
    pub content_type: Option<String>,
}

/// Storage service for generated documents and KYC uploads.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Storage key for a generated document PDF.
    #[must_use]
    pub fn document_key(user_id: Uuid, document_id: Uuid, document_number: &str) -> String {
        format!("documents/{user_id}/{document_id}/{document_number}.pdf")
    }

    /// Storage key for an uploaded KYC document.
    #[must_use]
    pub fn kyc_key(user_id: Uuid, kyc_document_id: Uuid, filename: &str) -> String {
        format!(
            "kyc/{user_id}/{kyc_document_id}/{}",
            sanitize_filename(filename)
        )
    }

    /// Validate a KYC upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the size or MIME type is not acceptable.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_upload_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_upload_size,
            });
        }
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::InvalidMimeType {
                mime_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Write an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.operator
            .write(key, bytes)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    /// Read an object's bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.operator
            .read(key)
            .await
            .map(|buf| buf.to_vec())
            .map_err(StorageError::from)
    }

    /// Delete an object. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Stat an object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    pub async fn stat(&self, key: &str) -> Result<StoredObject, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;
        Ok(StoredObject {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Generate a presigned download URL.
    ///
    /// # Errors
    ///
    /// Returns `PresignNotSupported` on the local filesystem backend.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.download_ttl_secs);
        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.download_ttl_secs).unwrap_or(i64::MAX),
                ),
        })
    }

    /// Get the provider name.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize a client-supplied filename for use in a storage key.
///
/// Only ASCII alphanumerics, dots, hyphens, and underscores survive.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("passport.pdf"), "passport.pdf");
        assert_eq!(sanitize_filename("my scan (1).png"), "my_scan__1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_document_key_shape() {
        let user = Uuid::new_v4();
        let doc = Uuid::new_v4();
        let key = StorageService::document_key(user, doc, "CRT-4B8Q1ZM2KX");
        assert!(key.starts_with("documents/"));
        assert!(key.ends_with("CRT-4B8Q1ZM2KX.pdf"));
        assert!(key.contains(&user.to_string()));
        assert!(key.contains(&doc.to_string()));
    }

    #[test]
    fn test_kyc_key_sanitizes_filename() {
        let user = Uuid::new_v4();
        let doc = Uuid::new_v4();
        let key = StorageService::kyc_key(user, doc, "id card.jpg");
        assert!(key.starts_with("kyc/"));
        assert!(key.ends_with("id_card.jpg"));
    }

    #[test]
    fn test_validate_upload() {
        let config = StorageConfig::new(StorageProvider::local_fs("./test"))
            .with_max_upload_size(1024);
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_upload("application/pdf", 512).is_ok());
        assert!(matches!(
            service.validate_upload("application/pdf", 2048),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            service.validate_upload("text/html", 512),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }

        #[test]
        fn prop_kyc_key_has_four_parts(filename in "[a-zA-Z0-9 ]{1,30}\\.[a-z]{2,4}") {
            let key = StorageService::kyc_key(Uuid::new_v4(), Uuid::new_v4(), &filename);
            let parts: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(parts.len(), 4);
            prop_assert_eq!(parts[0], "kyc");
        }
    }
}
