//! Catalog client for the Jikan v4 anime/manga metadata API.
//!
//! The crate is organised leaf-first:
//! - [`api`]: transport seam, response types and the typed gateway
//! - [`policy`]: the safe-content rule set applied to every request and detail record
//! - [`cache`]: the process-wide facet cache with pacing delays
//! - [`orchestrator`]: single-flight request orchestration and result state
//! - [`catalog`]: the service object that wires the pieces together

pub mod api;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod policy;

pub use api::{CatalogGateway, HttpTransport, Page, Transport, TransportResponse};
pub use cache::{CacheStats, FacetCache, FacetPacing, FacetPayload};
pub use catalog::Catalog;
pub use error::{CatalogError, CatalogResult};
pub use models::{CatalogItem, CatalogKind, Facet, FilterSpec, Genre, PaginationState};
pub use orchestrator::{CatalogOrchestrator, CatalogState, StreamPhase};
pub use policy::ContentPolicy;
