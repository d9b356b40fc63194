//! HTTP transport seam.
//!
//! The gateway only needs "GET this path with these query pairs and give me
//! the status and body", so that is all the trait exposes.

use crate::error::CatalogResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::config::CatalogConfig;
use tracing::debug;

/// Raw response before envelope decoding
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> CatalogResult<TransportResponse>;
}

/// reqwest-backed transport against the live API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(settings: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> CatalogResult<TransportResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, params = query.len(), "Sending request");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}
