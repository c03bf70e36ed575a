//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Lifecycle repositories apply the core crate's guard functions before
//! writing, with read-check-write inside a transaction.

pub mod client_request;
pub mod content;
pub mod document;
pub mod financing;
pub mod kyc;
pub mod notification;
pub mod payment;
pub mod session;
pub mod signature;
pub mod sweep;
pub mod user;

pub use client_request::{ClientRequestRepository, CreateClientRequestInput};
pub use content::ContentRepository;
pub use document::{DocumentService, VerifiedDocument};
pub use financing::{CreateApplicationInput, FinancingRepository, UpdateApplicationInput};
pub use kyc::{KycRepository, UploadKycDocumentInput};
pub use notification::{NotificationDispatcher, NotificationInput};
pub use payment::{CreatePaymentInput, PaymentRepository, Settlement};
pub use session::SessionRepository;
pub use signature::{SignArtifacts, SignatureRepository, SigningInput};
pub use sweep::SweepRepository;
pub use user::{UpdateProfileInput, UserRepository};
