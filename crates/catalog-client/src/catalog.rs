//! Service object wiring the gateway, facet cache and orchestrators.
//!
//! Build one [`Catalog`] at start-up and pass it by reference. Every
//! orchestrator it hands out shares the same gateway and facet cache.

use crate::api::{CatalogGateway, HttpTransport, Transport};
use crate::cache::{CacheStats, FacetCache, FacetPacing, FacetPayload};
use crate::models::{CatalogKind, Facet};
use crate::orchestrator::CatalogOrchestrator;
use crate::policy::ContentPolicy;
use anyhow::{Context, Result};
use shared::Config;
use std::sync::Arc;
use tracing::info;

pub struct Catalog {
    gateway: Arc<CatalogGateway>,
    facets: Arc<FacetCache>,
    min_query_chars: usize,
}

impl Catalog {
    /// Catalog backed by the live HTTP API
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.catalog).context("Failed to create catalog transport")?;
        info!(base_url = %transport.base_url(), "Catalog transport ready");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let policy = ContentPolicy::with_extra_genres(config.policy.extra_blocked_genres.iter().copied());
        info!(
            blocked_genres = ?policy.blocked_genres().collect::<Vec<_>>(),
            "Content policy active"
        );

        let gateway = Arc::new(CatalogGateway::new(transport, policy, &config.catalog));
        let facets = Arc::new(FacetCache::new(
            gateway.clone(),
            FacetPacing::from(&config.facets),
        ));

        Self {
            gateway,
            facets,
            min_query_chars: config.catalog.min_query_chars,
        }
    }

    /// New stream sharing this catalog's gateway
    pub fn orchestrator(&self) -> CatalogOrchestrator {
        CatalogOrchestrator::new(self.gateway.clone(), self.min_query_chars)
    }

    pub fn facets(&self) -> &Arc<FacetCache> {
        &self.facets
    }

    pub async fn get_facet(&self, kind: CatalogKind, id: u32, facet: Facet) -> FacetPayload {
        self.facets.get_facet(kind, id, facet).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.facets.stats()
    }
}
