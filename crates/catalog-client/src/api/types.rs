//! Jikan API v4 response types.
//!
//! These types represent the JSON envelopes and records returned by the API.
//! Only the fields the client normalizes are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Response envelope: `{ data, pagination? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub pagination: Option<ApiPagination>,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPagination {
    #[serde(default)]
    pub current_page: u32,
    pub has_next_page: bool,
    #[serde(default)]
    pub last_visible_page: u32,
}

/// Flattened response handed to callers instead of the transport response
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: T,
    pub pagination: Option<ApiPagination>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Page<U> {
        Page {
            data: f(self.data),
            pagination: self.pagination,
        }
    }
}

impl<T> From<Envelope<T>> for Page<T> {
    fn from(envelope: Envelope<T>) -> Self {
        Self {
            data: envelope.data,
            pagination: envelope.pagination,
        }
    }
}

/// Anime or manga record as returned by list, search and detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    pub mal_id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(rename = "type", default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub images: Option<EntryImages>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<MalEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryImages {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// MAL entity (genre, studio, producer, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    pub name: String,
}

/// Error body from Jikan API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Server-supplied message, if the body is a Jikan error document
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
