//! Unified error handling.
//!
//! Provides a unified `StorefrontError` wrapping each module's error
//! type. Embedders driving several stores can funnel everything into
//! `Result<T, StorefrontError>` with `?`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::ApiError;
use crate::services::contact::ContactFormError;
use crate::stores::cart::CartError;
use crate::stores::signup::SignupError;

/// Application-level error type for the storefront session core.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Sign-up operation failed.
    #[error("Sign-up error: {0}")]
    Signup(#[from] SignupError),

    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Contact form was invalid.
    #[error("Contact form error: {0}")]
    ContactForm(#[from] ContactFormError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
