//! Single-flight request orchestration.
//!
//! One orchestrator drives one logical stream (a listing, a search or a
//! detail fetch). Starting any request cancels the previous session before
//! the new call goes out, and a superseded session's result is discarded
//! without touching state, so the state only ever reflects the most recent
//! request.
//!
//! State is published through a [`tokio::sync::watch`] channel: callers can
//! read a snapshot at any time or subscribe to changes.

use crate::api::{CatalogGateway, Page};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogItem, CatalogKind, FilterSpec, PaginationState};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Seasonal listings are scoped to TV entries
const SEASONAL_FILTER: &str = "tv";

/// Lifecycle of the stream's latest request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StreamPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
    Canceled,
}

/// Observable result state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogState {
    pub phase: StreamPhase,
    pub items: Vec<CatalogItem>,
    pub selected_item: Option<CatalogItem>,
    pub pagination: PaginationState,
    /// True while the latest session is pending
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Session {
    generation: u64,
    token: CancellationToken,
}

/// Handle to the session a request was issued under
#[derive(Debug)]
struct Ticket {
    generation: u64,
    token: CancellationToken,
}

pub struct CatalogOrchestrator {
    gateway: Arc<CatalogGateway>,
    min_query_chars: usize,
    session: Mutex<Session>,
    state: watch::Sender<CatalogState>,
}

impl CatalogOrchestrator {
    pub fn new(gateway: Arc<CatalogGateway>, min_query_chars: usize) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            gateway,
            min_query_chars,
            session: Mutex::new(Session::default()),
            state,
        }
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<CatalogItem> {
        self.state.borrow().items.clone()
    }

    pub fn selected_item(&self) -> Option<CatalogItem> {
        self.state.borrow().selected_item.clone()
    }

    pub fn pagination(&self) -> PaginationState {
        self.state.borrow().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Top listing. `append` concatenates after the current items (infinite scroll).
    pub async fn fetch_listing(
        &self,
        kind: CatalogKind,
        page: u32,
        filter_type: Option<&str>,
        append: bool,
    ) -> CatalogResult<Option<Vec<CatalogItem>>> {
        let ticket = self.begin(false);
        let result = self
            .gateway
            .list_top(kind, page, filter_type, &ticket.token)
            .await;
        self.settle_listing(&ticket, result, append)
    }

    /// Currently airing season
    pub async fn fetch_seasonal(&self, page: u32, append: bool) -> CatalogResult<Option<Vec<CatalogItem>>> {
        let filters = FilterSpec {
            filter: Some(SEASONAL_FILTER.to_string()),
            ..Default::default()
        };

        let ticket = self.begin(false);
        let result = self
            .gateway
            .list_seasonal(page, &filters, &ticket.token)
            .await;
        self.settle_listing(&ticket, result, append)
    }

    /// Guarded search.
    ///
    /// An empty query without structured filters clears the stream. A query
    /// shorter than the minimum without structured filters is ignored so
    /// that every keystroke does not become a request.
    pub async fn search(
        &self,
        query: &str,
        kind: CatalogKind,
        filters: &FilterSpec,
        page: u32,
        append: bool,
    ) -> CatalogResult<Option<Vec<CatalogItem>>> {
        let query = query.trim();
        // Guard on what will actually be sent: the policy may strip filters
        let filters = self.gateway.policy().augment_outbound(filters);
        let has_filters = filters.has_active_filters();

        if query.is_empty() && !has_filters {
            self.clear();
            return Ok(None);
        }

        if !query.is_empty() && query.chars().count() < self.min_query_chars && !has_filters {
            debug!(query = %query, min_chars = self.min_query_chars, "Query too short, skipping search");
            return Ok(None);
        }

        let spec = FilterSpec {
            query: (!query.is_empty()).then(|| query.to_string()),
            page: Some(page),
            ..filters
        };

        let ticket = self.begin(false);
        let result = self.gateway.search(kind, &spec, &ticket.token).await;
        self.settle_listing(&ticket, result, append)
    }

    /// Single record fetch, checked against the content policy
    pub async fn fetch_detail(&self, kind: CatalogKind, id: u32) -> CatalogResult<Option<CatalogItem>> {
        let ticket = self.begin(true);
        let result = self
            .gateway
            .get_detail(kind, id, &ticket.token)
            .await
            .and_then(|item| {
                self.gateway.policy().check_record(kind, &item)?;
                Ok(item)
            });

        match result {
            Ok(item) => {
                let applied = self.resolve(&ticket, |state| {
                    state.selected_item = Some(item.clone());
                    state.phase = StreamPhase::Success;
                    state.loading = false;
                });
                Ok(applied.then_some(item))
            }
            Err(err) => self.settle_error(&ticket, err),
        }
    }

    /// Cancel the live session and reset items, selection and error.
    ///
    /// Safe to call repeatedly.
    pub fn clear(&self) {
        let mut session = self.lock_session();
        session.token.cancel();
        session.generation += 1;
        session.token = CancellationToken::new();

        self.state.send_modify(|state| {
            state.phase = if state.loading {
                StreamPhase::Canceled
            } else {
                StreamPhase::Idle
            };
            state.items.clear();
            state.selected_item = None;
            state.error = None;
            state.pagination = PaginationState::default();
            state.loading = false;
        });
        debug!(generation = session.generation, "Stream cleared");
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the previous session and open a new one
    fn begin(&self, clear_selection: bool) -> Ticket {
        let mut session = self.lock_session();
        session.token.cancel();
        session.generation += 1;
        session.token = CancellationToken::new();

        self.state.send_modify(|state| {
            state.phase = StreamPhase::Loading;
            state.loading = true;
            state.error = None;
            if clear_selection {
                state.selected_item = None;
            }
        });

        debug!(generation = session.generation, "Session started");
        Ticket {
            generation: session.generation,
            token: session.token.clone(),
        }
    }

    /// Apply `update` only if `ticket` is still the live session
    fn resolve(&self, ticket: &Ticket, update: impl FnOnce(&mut CatalogState)) -> bool {
        let session = self.lock_session();
        if session.generation != ticket.generation {
            debug!(
                generation = ticket.generation,
                current = session.generation,
                "Discarding superseded result"
            );
            return false;
        }
        self.state.send_modify(update);
        true
    }

    fn settle_listing(
        &self,
        ticket: &Ticket,
        result: CatalogResult<Page<Vec<CatalogItem>>>,
        append: bool,
    ) -> CatalogResult<Option<Vec<CatalogItem>>> {
        let page = match result {
            Ok(page) => page,
            Err(err) => return self.settle_error(ticket, err),
        };

        let applied = self.resolve(ticket, |state| {
            if append {
                state.items.extend(page.data.iter().cloned());
            } else {
                state.items = page.data.clone();
            }
            if let Some(pagination) = &page.pagination {
                state.pagination = PaginationState::from(pagination);
            }
            state.phase = StreamPhase::Success;
            state.loading = false;
        });

        if applied {
            info!(
                count = page.data.len(),
                append = append,
                generation = ticket.generation,
                "Results applied"
            );
            Ok(Some(page.data))
        } else {
            Ok(None)
        }
    }

    /// Record a failure for the live session. Cancellation and superseded
    /// sessions are absorbed and resolve to `Ok(None)`.
    fn settle_error<T>(&self, ticket: &Ticket, err: CatalogError) -> CatalogResult<Option<T>> {
        if err.is_canceled() {
            debug!(generation = ticket.generation, "Request canceled");
            return Ok(None);
        }

        let message = err.user_message();
        let applied = self.resolve(ticket, |state| {
            state.error = Some(message);
            state.phase = StreamPhase::Failed;
            state.loading = false;
        });

        if applied {
            warn!(error = %err, retryable = err.is_retryable(), "Catalog request failed");
            Err(err)
        } else {
            Ok(None)
        }
    }
}
