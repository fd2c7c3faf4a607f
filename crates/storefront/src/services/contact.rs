//! Contact form submission client.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use lockerbay_core::{Email, EmailError};

use super::ApiError;
use crate::config::StorefrontConfig;

/// Errors building a [`ContactForm`].
#[derive(Debug, Error)]
pub enum ContactFormError {
    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required field is empty.
    #[error("{0} is required")]
    Missing(&'static str),
}

/// A validated contact submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactForm {
    name: String,
    email: Email,
    subject: String,
    message: String,
}

impl ContactForm {
    /// Build a contact form, trimming and validating every field.
    ///
    /// # Errors
    ///
    /// Returns [`ContactFormError`] if the email is malformed or any
    /// field is empty after trimming.
    pub fn new(
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<Self, ContactFormError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContactFormError::Missing("name"));
        }

        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ContactFormError::Missing("subject"));
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(ContactFormError::Missing("message"));
        }

        let email = Email::parse(email.trim())?;

        Ok(Self {
            name: name.to_owned(),
            email,
            subject: subject.to_owned(),
            message: message.to_owned(),
        })
    }

    /// The sender's email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// Response shape of the contact endpoint.
#[derive(Debug, Deserialize)]
struct ContactResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the contact submission endpoint.
#[derive(Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ContactClient {
    /// Create a new contact client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    /// Submit a contact form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails, the backend responds
    /// with a non-success status, or the backend answers `ok: false`.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn submit(&self, form: &ContactForm) -> Result<(), ApiError> {
        let url = self.base_url.join("api/contact")?;

        let mut request = self.http.post(url).json(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ContactResponse = response.json().await?;
        if !body.ok {
            return Err(ApiError::Rejected(body.error.unwrap_or_default()));
        }

        tracing::info!("contact form submitted");
        Ok(())
    }
}
