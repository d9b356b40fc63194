//! Jikan API v4 access layer.
//!
//! This module provides the transport seam, the response types and the
//! typed gateway that enforces the content policy and rate-limit retry.

pub mod gateway;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::CatalogGateway;
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use types::Page;
