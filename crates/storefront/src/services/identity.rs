//! Hosted identity provider abstraction.
//!
//! Sign-up delegates federated sign-in and verification-link delivery to
//! a hosted provider. The session core only depends on this trait; the
//! concrete OAuth/email plumbing lives in the embedding application.

use async_trait::async_trait;
use thiserror::Error;

use lockerbay_core::Email;

/// Identity returned by a federated sign-in.
///
/// Federated identities arrive pre-verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Verified email address.
    pub email: Email,
    /// Display name reported by the provider.
    pub full_name: String,
}

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The user dismissed the provider's sign-in surface.
    #[error("sign-in was cancelled")]
    Cancelled,

    /// The provider failed.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Operations the sign-up flow needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run a federated sign-in and return the verified identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Cancelled`] if the user backs out, or
    /// [`IdentityError::Provider`] on provider failure. Both are
    /// non-fatal to the sign-up flow.
    async fn start_federated_sign_in(&self) -> Result<FederatedIdentity, IdentityError>;

    /// Send a verification link to `email`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Provider`] if the link could not be sent.
    async fn send_verification_link(&self, email: &Email) -> Result<(), IdentityError>;
}
