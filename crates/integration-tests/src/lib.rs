//! Integration tests for LockerBay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lockerbay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_consistency` - Merge/clamp semantics and failure rollback
//! - `cart_reentrancy` - In-flight serialization of cart mutations
//! - `signup_flow` - Wizard transitions, resume, and the discard guard
//! - `logout_broadcast` - Cross-store reactions to logout
//! - `backend_api` - Live catalog/contact endpoints (ignored by default)
//!
//! The support code below wires stores together the way the UI shell
//! does, so scenario tests read like shopper sessions.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use lockerbay_core::{CurrencyCode, Email, Price, ProductId};
use lockerbay_storefront::services::identity::{
    FederatedIdentity, IdentityError, IdentityProvider,
};
use lockerbay_storefront::stores::cart::AddToCartRequest;

/// Build an add-to-cart request with a flat $10.00 unit price.
///
/// # Panics
///
/// Panics if the hard-coded price is rejected, which cannot happen.
#[must_use]
pub fn add_request(id: i64, quantity: u32, stock_limit: u32) -> AddToCartRequest {
    AddToCartRequest {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        image: format!("/img/{id}.webp"),
        unit_price: Price::new(Decimal::new(1000, 2), CurrencyCode::ARS)
            .expect("non-negative price"),
        quantity,
        stock_limit,
    }
}

/// Identity provider stub that accepts everything and counts sends.
#[derive(Debug, Default)]
pub struct StubIdentityProvider {
    sends: AtomicUsize,
}

impl StubIdentityProvider {
    /// Create a stub provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of verification links sent so far.
    #[must_use]
    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn start_federated_sign_in(&self) -> Result<FederatedIdentity, IdentityError> {
        Ok(FederatedIdentity {
            email: Email::parse("federated@example.com").map_err(|e| {
                IdentityError::Provider(e.to_string())
            })?,
            full_name: "Federated Shopper".to_owned(),
        })
    }

    async fn send_verification_link(&self, _email: &Email) -> Result<(), IdentityError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `Arc` an identity provider as the trait object the flow expects.
#[must_use]
pub fn stub_provider() -> Arc<dyn IdentityProvider> {
    Arc::new(StubIdentityProvider::new())
}
