//! Error taxonomy for catalog requests.

use crate::models::CatalogKind;
use thiserror::Error;

/// Result alias used throughout the catalog client
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Message shown when nothing more specific is known
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to reach the catalog service.";

/// Message shown when a detail record is withheld by the content policy
pub const POLICY_VIOLATION_MESSAGE: &str = "Access denied: content violates the safety policy.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The request was superseded or cleared. Never surfaced to users.
    #[error("request canceled")]
    Canceled,

    /// Upstream kept answering 429 after the automatic retry
    #[error("rate limited by upstream after {attempts} attempts")]
    RateLimited {
        attempts: u32,
        message: Option<String>,
    },

    /// 504-class response; the caller decides whether to try again
    #[error("catalog service temporarily unavailable")]
    TransientUnavailable { message: Option<String> },

    #[error("not found: {resource}")]
    NotFound {
        resource: String,
        message: Option<String>,
    },

    /// A detail record failed the content policy and was withheld
    #[error("{kind} {id} withheld by content policy (rating: {rating})")]
    PolicyViolation {
        kind: CatalogKind,
        id: u32,
        rating: String,
    },

    #[error("request failed: {detail}")]
    NetworkOrUnknown {
        status: Option<u16>,
        message: Option<String>,
        detail: String,
    },
}

impl CatalogError {
    pub fn network(detail: impl Into<String>) -> Self {
        Self::NetworkOrUnknown {
            status: None,
            message: None,
            detail: detail.into(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Whether trying the same request again later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::TransientUnavailable { .. } | Self::NetworkOrUnknown { status: None, .. }
        )
    }

    /// Human-readable message for the `error` state field.
    ///
    /// A server-supplied message wins over the built-in text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Canceled => String::new(),
            Self::PolicyViolation { .. } => POLICY_VIOLATION_MESSAGE.to_string(),
            Self::RateLimited { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Too many requests. Please wait a moment and try again.".to_string()),
            Self::TransientUnavailable { message } => message
                .clone()
                .unwrap_or_else(|| "The catalog service is temporarily unavailable.".to_string()),
            Self::NotFound { message, .. } => message
                .clone()
                .unwrap_or_else(|| "The requested entry could not be found.".to_string()),
            Self::NetworkOrUnknown { message, .. } => message
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::network(format!("failed to connect: {}", err))
        } else {
            Self::NetworkOrUnknown {
                status: err.status().map(|s| s.as_u16()),
                message: None,
                detail: err.to_string(),
            }
        }
    }
}

impl CatalogError {
    /// Body of a successful response that does not match the expected shape.
    /// Carries the status so it is not mistaken for a retryable network fault.
    pub fn decode(status: u16, err: &serde_json::Error) -> Self {
        Self::NetworkOrUnknown {
            status: Some(status),
            message: None,
            detail: format!("failed to parse response: {}", err),
        }
    }
}
