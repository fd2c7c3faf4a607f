//! LockerBay Core - Shared types library.
//!
//! This crate provides common types used across all LockerBay components:
//! - `storefront` - Shopper-facing session core (cart, sign-up, session)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no async. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails,
//!   profile fields, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
