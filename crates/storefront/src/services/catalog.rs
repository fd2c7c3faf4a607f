//! Catalog/content API client.
//!
//! Read-only JSON endpoints served by the LockerBay backend. Responses
//! are cached with a TTL so browsing does not hammer the backend.

use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use lockerbay_core::{CategoryId, CategoryStatus};

use super::ApiError;
use crate::config::StorefrontConfig;

/// Cache key for the categories collection.
const CATEGORIES_KEY: &str = "categories";

/// A product category as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub product_count: u32,
    pub status: CategoryStatus,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Client for the catalog/content API.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    categories: Cache<&'static str, Vec<Category>>,
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let categories = Cache::builder()
            .max_capacity(8)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
            categories,
        })
    }

    /// Fetch the active categories, from cache when fresh.
    ///
    /// Entries whose status is `inactive` are filtered out before the
    /// result is cached or returned.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails, the backend responds
    /// with a non-success status, or the body cannot be decoded.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(hit) = self.categories.get(CATEGORIES_KEY).await {
            tracing::debug!("categories served from cache");
            return Ok(hit);
        }

        let fresh = self.fetch_categories().await?;
        self.categories.insert(CATEGORIES_KEY, fresh.clone()).await;
        Ok(fresh)
    }

    /// Drop any cached categories so the next call refetches.
    pub async fn invalidate(&self) {
        self.categories.invalidate(CATEGORIES_KEY).await;
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.base_url.join("api/categories")?;

        let mut request = self.http.get(url);
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

        let categories: Vec<Category> = response.json().await?;
        let active: Vec<Category> = categories
            .into_iter()
            .filter(|category| category.status.is_active())
            .collect();

        tracing::debug!(count = active.len(), "categories fetched");
        Ok(active)
    }
}
