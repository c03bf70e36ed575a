//! `SeaORM` entity definitions.
//!
//! Status columns are plain strings; the core crate's closed enums own the
//! vocabulary and repositories parse on read.

pub mod client_requests;
pub mod content_pages;
pub mod documents;
pub mod faq_items;
pub mod financing_applications;
pub mod installments;
pub mod kyc_applications;
pub mod kyc_documents;
pub mod notifications;
pub mod payments;
pub mod scheduled_payments;
pub mod sessions;
pub mod signature_requests;
pub mod signatures;
pub mod user_profiles;
pub mod users;
