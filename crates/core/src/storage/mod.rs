//! Object storage for generated documents and KYC uploads, backed by
//! Apache OpenDAL.
//!
//! Two key namespaces share one bucket: `documents/` for server-rendered
//! PDFs and `kyc/` for client uploads. Generated PDFs are written and read
//! server-side; downloads can also go through presigned URLs when the
//! backend supports them.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{PresignedUrl, StorageService, StoredObject};
