//! LockerBay Storefront session core.
//!
//! This crate provides the state machines behind the shopper-facing
//! storefront as a library, allowing a UI shell to drive them and tests
//! to exercise them headlessly:
//!
//! - [`stores::CartStore`] - in-memory cart with stock-aware merge
//! - [`stores::SignupFlow`] - sign-up wizard with resumable verification
//! - [`stores::SessionStore`] - the authenticated session
//! - [`events::EventBus`] - cross-store signaling (logout, navigation)
//! - [`cache`] - durable key-value cache backing sign-up resume
//! - [`services`] - catalog/contact clients and provider abstractions
//!
//! # Architecture
//!
//! Stores own their state exclusively; all mutation goes through their
//! methods. Nothing here renders UI - user-visible outcomes go through
//! the [`services::Notifier`] trait and page moves through the bus.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod stores;
pub mod telemetry;
