//! Core business logic for Novafin.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, status machines, and calculations live here.
//!
//! # Modules
//!
//! - `financing` - Application lifecycle, fee calculator, installment schedule
//! - `kyc` - Identity verification status transitions
//! - `payment` - Payment statuses, gateway mapping, webhook signatures
//! - `signature` - Electronic signature requests and expiry policy
//! - `document` - PDF artifacts and verification codes
//! - `notification` - Notification categories and channels
//! - `request` - Client service requests and admin resolution
//! - `auth` - Password hashing and TOTP MFA
//! - `storage` - Vendor-agnostic object storage for generated files

pub mod auth;
pub mod document;
pub mod financing;
pub mod kyc;
pub mod notification;
pub mod payment;
pub mod request;
pub mod signature;
pub mod storage;
