//! Jikan API gateway with content policy and rate-limit retry.

use super::transport::Transport;
use super::types::{ApiErrorBody, Envelope, Page, RawEntry};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogItem, CatalogKind, Facet, FilterSpec};
use crate::policy::ContentPolicy;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use shared::config::CatalogConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A 429 is retried once; the second one is surfaced
const MAX_ATTEMPTS: u32 = 2;

/// Typed access to the upstream catalog endpoints
pub struct CatalogGateway {
    transport: Arc<dyn Transport>,
    policy: ContentPolicy,
    listing_limit: u32,
    search_limit: u32,
    rate_limit_backoff: Duration,
}

impl CatalogGateway {
    pub fn new(transport: Arc<dyn Transport>, policy: ContentPolicy, settings: &CatalogConfig) -> Self {
        Self {
            transport,
            policy,
            listing_limit: settings.listing_limit,
            search_limit: settings.search_limit,
            rate_limit_backoff: settings.rate_limit_backoff(),
        }
    }

    pub fn policy(&self) -> &ContentPolicy {
        &self.policy
    }

    /// Make a GET request with the content policy applied and one retry on 429.
    ///
    /// `cancel` is checked after every suspension point.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &FilterSpec,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<T>> {
        let query = self.policy.augment_outbound(filters).to_query();

        for attempt in 1..=MAX_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(CatalogError::Canceled);
            }

            debug!(path = %path, attempt = attempt, "Making API request");
            let result = self.transport.get(path, &query).await;
            if cancel.is_cancelled() {
                debug!(path = %path, "Request canceled while in flight");
                return Err(CatalogError::Canceled);
            }

            let response = result.map_err(|e| {
                warn!(path = %path, error = %e, "Request error");
                e
            })?;
            let status = response.status;

            if status.is_success() {
                let envelope: Envelope<T> = serde_json::from_str(&response.body).map_err(|e| {
                    warn!(path = %path, error = %e, "Failed to parse response");
                    CatalogError::decode(status.as_u16(), &e)
                })?;
                debug!(path = %path, "Request successful");
                return Ok(envelope.into());
            }

            let message = ApiErrorBody::message_from(&response.body);

            match status {
                StatusCode::TOO_MANY_REQUESTS if attempt < MAX_ATTEMPTS => {
                    warn!(
                        path = %path,
                        delay_ms = self.rate_limit_backoff.as_millis(),
                        "Rate limited by server, waiting"
                    );
                    sleep(self.rate_limit_backoff).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!(path = %path, attempts = attempt, "Still rate limited after retry");
                    return Err(CatalogError::RateLimited {
                        attempts: attempt,
                        message,
                    });
                }
                StatusCode::GATEWAY_TIMEOUT => {
                    warn!(path = %path, "Upstream gateway timeout");
                    return Err(CatalogError::TransientUnavailable { message });
                }
                StatusCode::NOT_FOUND => {
                    debug!(path = %path, "Resource not found");
                    return Err(CatalogError::NotFound {
                        resource: path.to_string(),
                        message,
                    });
                }
                other => {
                    warn!(path = %path, status = %other, "Request failed");
                    return Err(CatalogError::NetworkOrUnknown {
                        status: Some(other.as_u16()),
                        message,
                        detail: format!("HTTP {} from {}", other, path),
                    });
                }
            }
        }

        // The final attempt always returns from inside the loop
        Err(CatalogError::RateLimited {
            attempts: MAX_ATTEMPTS,
            message: None,
        })
    }

    /// Top-ranked entries, e.g. `filter_type = "airing"` for anime
    pub async fn list_top(
        &self,
        kind: CatalogKind,
        page: u32,
        filter_type: Option<&str>,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<Vec<CatalogItem>>> {
        info!(kind = %kind, page = page, filter = ?filter_type, "Fetching top listing");
        let filters = FilterSpec {
            page: Some(page.max(1)),
            limit: Some(self.listing_limit),
            filter: filter_type.map(str::to_string),
            ..Default::default()
        };
        self.get_entries(&format!("/top/{}", kind), &filters, cancel).await
    }

    /// Free-text and structured search
    pub async fn search(
        &self,
        kind: CatalogKind,
        filters: &FilterSpec,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<Vec<CatalogItem>>> {
        info!(kind = %kind, query = ?filters.query, page = ?filters.page, "Searching catalog");
        let filters = FilterSpec {
            page: Some(filters.page.unwrap_or(1).max(1)),
            limit: Some(self.search_limit),
            ..filters.clone()
        };
        self.get_entries(&format!("/{}", kind), &filters, cancel).await
    }

    /// Full record for a single entry
    pub async fn get_detail(
        &self,
        kind: CatalogKind,
        id: u32,
        cancel: &CancellationToken,
    ) -> CatalogResult<CatalogItem> {
        debug!(kind = %kind, mal_id = id, "Fetching detail");
        let page: Page<RawEntry> = self
            .get(&format!("/{}/{}/full", kind, id), &FilterSpec::default(), cancel)
            .await?;
        Ok(page.data.into())
    }

    /// Currently airing season
    pub async fn list_seasonal(
        &self,
        page: u32,
        filters: &FilterSpec,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<Vec<CatalogItem>>> {
        info!(page = page, "Fetching seasonal listing");
        let filters = FilterSpec {
            page: Some(page.max(1)),
            limit: Some(self.listing_limit),
            ..filters.clone()
        };
        self.get_entries("/seasons/now", &filters, cancel).await
    }

    /// Raw facet payload (a list of records, or an object for videos)
    pub async fn get_facet(
        &self,
        kind: CatalogKind,
        id: u32,
        facet: Facet,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<serde_json::Value>> {
        debug!(kind = %kind, mal_id = id, facet = %facet, "Fetching facet");
        self.get(&format!("/{}/{}/{}", kind, id, facet), &FilterSpec::default(), cancel)
            .await
    }

    async fn get_entries(
        &self,
        path: &str,
        filters: &FilterSpec,
        cancel: &CancellationToken,
    ) -> CatalogResult<Page<Vec<CatalogItem>>> {
        let page: Page<Vec<RawEntry>> = self.get(path, filters, cancel).await?;
        Ok(page.map(|entries| entries.into_iter().map(CatalogItem::from).collect()))
    }
}
