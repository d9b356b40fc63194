//! Facet cache for secondary per-entity records.
//!
//! Entries are permanent for the life of the process. The first fetch of a
//! key is paced by a facet-specific delay to spread bursts of calls; later
//! reads are served from memory. Concurrent readers of an unpopulated key
//! share a single in-flight request.

use crate::api::CatalogGateway;
use crate::models::{CatalogKind, Facet};
use serde_json::Value;
use shared::config::FacetConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Raw facet payload: a list of records, or an object for videos
pub type FacetPayload = Value;

/// Fallback stored when a facet is missing or failed to load
pub fn empty_payload() -> FacetPayload {
    Value::Array(Vec::new())
}

/// Delay before the first network fetch of each facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetPacing {
    pub characters: Duration,
    pub recommendations: Duration,
    pub staff: Duration,
    pub videos: Duration,
}

impl FacetPacing {
    pub fn none() -> Self {
        Self {
            characters: Duration::ZERO,
            recommendations: Duration::ZERO,
            staff: Duration::ZERO,
            videos: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, facet: Facet) -> Duration {
        match facet {
            Facet::Characters => self.characters,
            Facet::Recommendations => self.recommendations,
            Facet::Staff => self.staff,
            Facet::Videos => self.videos,
        }
    }
}

impl Default for FacetPacing {
    fn default() -> Self {
        Self::from(&FacetConfig::default())
    }
}

impl From<&FacetConfig> for FacetPacing {
    fn from(config: &FacetConfig) -> Self {
        Self {
            characters: Duration::from_millis(config.characters_delay_ms),
            recommendations: Duration::from_millis(config.recommendations_delay_ms),
            staff: Duration::from_millis(config.staff_delay_ms),
            videos: Duration::from_millis(config.videos_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FacetKey {
    kind: CatalogKind,
    id: u32,
    facet: Facet,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide facet cache shared by every orchestrator
pub struct FacetCache {
    gateway: Arc<CatalogGateway>,
    pacing: FacetPacing,
    /// Doubles as the in-flight map: an uninitialised cell is a fetch in progress
    entries: Mutex<HashMap<FacetKey, Arc<OnceCell<FacetPayload>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FacetCache {
    pub fn new(gateway: Arc<CatalogGateway>, pacing: FacetPacing) -> Self {
        Self {
            gateway,
            pacing,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Facet payload for an entry; never fails, errors become an empty payload
    pub async fn get_facet(&self, kind: CatalogKind, id: u32, facet: Facet) -> FacetPayload {
        if !facet.applies_to(kind) {
            debug!(kind = %kind, facet = %facet, "Facet not available for kind");
            return empty_payload();
        }

        let key = FacetKey { kind, id, facet };
        let cell = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone();

        if let Some(payload) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(kind = %kind, mal_id = id, facet = %facet, "Cache hit");
            return payload.clone();
        }

        // Only the reader that runs the fetch counts as a miss; readers that
        // waited on it are served the shared result
        let mut fetched = false;
        let payload = cell
            .get_or_init(|| {
                fetched = true;
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(kind = %kind, mal_id = id, facet = %facet, "Cache miss");
                self.fetch(key)
            })
            .await
            .clone();

        if !fetched {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        payload
    }

    /// Whether a payload (possibly the empty fallback) is already stored
    pub fn contains(&self, kind: CatalogKind, id: u32, facet: Facet) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&FacetKey { kind, id, facet })
            .is_some_and(|cell| cell.initialized())
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count();

        CacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn fetch(&self, key: FacetKey) -> FacetPayload {
        let delay = self.pacing.delay_for(key.facet);
        if !delay.is_zero() {
            debug!(facet = %key.facet, delay_ms = delay.as_millis(), "Pacing facet request");
            sleep(delay).await;
        }

        // Facet fetches are shared across sessions, so they are never canceled
        match self
            .gateway
            .get_facet(key.kind, key.id, key.facet, &CancellationToken::new())
            .await
        {
            Ok(page) => {
                debug!(kind = %key.kind, mal_id = key.id, facet = %key.facet, "Cache stored");
                page.data
            }
            Err(e) => {
                warn!(
                    kind = %key.kind,
                    mal_id = key.id,
                    facet = %key.facet,
                    error = %e,
                    "Failed to fetch facet, storing empty result"
                );
                empty_payload()
            }
        }
    }
}
