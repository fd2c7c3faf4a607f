//! External collaborators of the session core.
//!
//! The storefront consumes a read-only catalog/content API, a contact
//! submission endpoint, a hosted identity provider, and a notification
//! surface. Clients here own the HTTP plumbing; provider and notifier
//! are traits so embedders and tests can substitute their own.

pub mod catalog;
pub mod contact;
pub mod identity;
pub mod notify;

pub use catalog::{CatalogClient, Category};
pub use contact::{ContactClient, ContactForm, ContactFormError};
pub use identity::{FederatedIdentity, IdentityError, IdentityProvider};
pub use notify::{BufferNotifier, Notifier, Severity, TracingNotifier};

use thiserror::Error;

/// Errors from the backend HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend accepted the request but rejected its content.
    #[error("submission rejected: {0}")]
    Rejected(String),
}
