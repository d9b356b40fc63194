//! Normalized catalog records and request parameters.

use crate::api::types::{ApiPagination, RawEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource family exposed by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Anime,
    Manga,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Anime => "anime",
            CatalogKind::Manga => "manga",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anime" => Ok(CatalogKind::Anime),
            "manga" => Ok(CatalogKind::Manga),
            other => Err(format!("unknown catalog kind: {}", other)),
        }
    }
}

/// Secondary per-entity sub-resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Characters,
    Staff,
    Recommendations,
    Videos,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::Characters,
        Facet::Staff,
        Facet::Recommendations,
        Facet::Videos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Characters => "characters",
            Facet::Staff => "staff",
            Facet::Recommendations => "recommendations",
            Facet::Videos => "videos",
        }
    }

    /// Manga entries have no staff or video endpoints upstream
    pub fn applies_to(&self, kind: CatalogKind) -> bool {
        match kind {
            CatalogKind::Anime => true,
            CatalogKind::Manga => matches!(self, Facet::Characters | Facet::Recommendations),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::ALL
            .into_iter()
            .find(|facet| facet.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown facet: {}", s))
    }
}

/// Genre descriptor attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: u32,
    pub name: String,
}

/// Normalized anime/manga record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub mal_id: u32,
    pub title: String,
    pub title_japanese: Option<String>,
    pub rating: Option<String>,
    pub genres: Vec<Genre>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
    /// TV, Movie, Manga, Novel, One-shot, ...
    pub entry_type: Option<String>,
}

impl From<RawEntry> for CatalogItem {
    fn from(raw: RawEntry) -> Self {
        let image_url = raw
            .images
            .and_then(|images| images.jpg)
            .and_then(|jpg| jpg.large_image_url.or(jpg.image_url));

        Self {
            mal_id: raw.mal_id,
            title: raw.title,
            title_japanese: raw.title_japanese,
            rating: raw.rating,
            genres: raw
                .genres
                .into_iter()
                .map(|g| Genre {
                    mal_id: g.mal_id,
                    name: g.name,
                })
                .collect(),
            image_url,
            score: raw.score,
            entry_type: raw.entry_type,
        }
    }
}

/// Pagination bookkeeping for the active listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub has_next_page: bool,
    pub last_visible_page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            has_next_page: false,
            last_visible_page: 1,
        }
    }
}

impl From<&ApiPagination> for PaginationState {
    /// Keeps `1 <= current_page <= last_visible_page` even when upstream
    /// reports zero or an out-of-range last page.
    fn from(p: &ApiPagination) -> Self {
        let current_page = p.current_page.max(1);
        Self {
            current_page,
            has_next_page: p.has_next_page,
            last_visible_page: p.last_visible_page.max(current_page),
        }
    }
}

/// Query parameters for list/search calls.
///
/// Always passed through [`crate::policy::ContentPolicy::augment_outbound`]
/// before it reaches the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub query: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub genres: Vec<u32>,
    pub genres_exclude: Vec<u32>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub entry_type: Option<String>,
    pub filter: Option<String>,
    pub sfw: Option<bool>,
}

impl FilterSpec {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    /// Structured filters that make a short (or empty) query worth sending
    pub fn has_active_filters(&self) -> bool {
        !self.genres.is_empty()
            || is_set(&self.status)
            || is_set(&self.rating)
            || is_set(&self.entry_type)
    }

    /// Serialize into upstream query pairs. Empty values are omitted and
    /// lists are comma-joined.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();

        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.push((key.to_string(), value));
            }
        };

        push("q", self.query.clone());
        push("page", self.page.map(|p| p.to_string()));
        push("limit", self.limit.map(|l| l.to_string()));
        push("sfw", self.sfw.map(|s| s.to_string()));
        push("genres", Some(join_codes(&self.genres)));
        push("genres_exclude", Some(join_codes(&self.genres_exclude)));
        push("status", self.status.clone());
        push("rating", self.rating.clone());
        push("type", self.entry_type.clone());
        push("filter", self.filter.clone());

        query
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn join_codes(codes: &[u32]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Envelope;

    #[test]
    fn test_item_from_upstream_record() {
        let body = r#"{
            "data": {
                "mal_id": 5114,
                "title": "Fullmetal Alchemist: Brotherhood",
                "title_japanese": "鋼の錬金術師 FULLMETAL ALCHEMIST",
                "type": "TV",
                "rating": "R - 17+ (violence & profanity)",
                "score": 9.1,
                "images": { "jpg": {
                    "image_url": "https://cdn.example/fma.jpg",
                    "large_image_url": "https://cdn.example/fma_l.jpg"
                } },
                "genres": [
                    { "mal_id": 1, "type": "anime", "name": "Action", "url": "https://myanimelist.net/anime/genre/1" }
                ]
            }
        }"#;

        let envelope: Envelope<RawEntry> = serde_json::from_str(body).unwrap();
        let item = CatalogItem::from(envelope.data);

        assert_eq!(item.mal_id, 5114);
        assert_eq!(item.entry_type.as_deref(), Some("TV"));
        assert_eq!(item.image_url.as_deref(), Some("https://cdn.example/fma_l.jpg"));
        assert_eq!(item.genres, vec![Genre { mal_id: 1, name: "Action".to_string() }]);
        assert_eq!(item.score, Some(9.1));
    }

    #[test]
    fn test_item_tolerates_sparse_record() {
        let raw: RawEntry = serde_json::from_str(r#"{ "mal_id": 1, "title": "x", "score": null }"#).unwrap();
        let item = CatalogItem::from(raw);
        assert!(item.genres.is_empty());
        assert_eq!(item.score, None);
        assert_eq!(item.image_url, None);
    }

    #[test]
    fn test_filter_query_serialization() {
        let spec = FilterSpec {
            query: Some("frieren".to_string()),
            page: Some(2),
            genres: vec![1, 2],
            genres_exclude: vec![12, 49],
            status: Some("airing".to_string()),
            sfw: Some(true),
            ..Default::default()
        };

        let query = spec.to_query();
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("q"), Some("frieren"));
        assert_eq!(get("page"), Some("2"));
        assert_eq!(get("genres"), Some("1,2"));
        assert_eq!(get("genres_exclude"), Some("12,49"));
        assert_eq!(get("sfw"), Some("true"));
        assert_eq!(get("rating"), None);
        assert_eq!(get("type"), None);
    }

    #[test]
    fn test_active_filters() {
        assert!(!FilterSpec::default().has_active_filters());
        assert!(!FilterSpec::page(3).has_active_filters());
        assert!(FilterSpec { genres: vec![1], ..Default::default() }.has_active_filters());
        assert!(FilterSpec { status: Some("complete".into()), ..Default::default() }.has_active_filters());
        assert!(!FilterSpec { status: Some("  ".into()), ..Default::default() }.has_active_filters());
        // exclusions alone do not make a query worth sending
        assert!(!FilterSpec { genres_exclude: vec![9], ..Default::default() }.has_active_filters());
    }

    #[test]
    fn test_pagination_normalization() {
        let p = ApiPagination {
            current_page: 0,
            has_next_page: false,
            last_visible_page: 0,
        };
        assert_eq!(PaginationState::from(&p), PaginationState::default());

        let p = ApiPagination {
            current_page: 4,
            has_next_page: true,
            last_visible_page: 2,
        };
        let state = PaginationState::from(&p);
        assert_eq!(state.current_page, 4);
        assert_eq!(state.last_visible_page, 4);
    }

    #[test]
    fn test_kind_and_facet_parsing() {
        assert_eq!("Manga".parse::<CatalogKind>(), Ok(CatalogKind::Manga));
        assert!("novel".parse::<CatalogKind>().is_err());
        assert_eq!("videos".parse::<Facet>(), Ok(Facet::Videos));
        assert!(!Facet::Staff.applies_to(CatalogKind::Manga));
        assert!(Facet::Recommendations.applies_to(CatalogKind::Manga));
    }
}
