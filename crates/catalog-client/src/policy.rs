//! Safe-content rule set.
//!
//! Applied twice: outbound, every query is widened so upstream filters
//! explicit material; inbound, detail records with a restricted rating are
//! rejected.

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogItem, CatalogKind, FilterSpec};
use std::collections::BTreeSet;

/// Genre codes excluded from every query: Hentai, Erotica, Boys Love, Girls Love
pub const BLOCKED_GENRES: [u32; 4] = [12, 49, 28, 26];

/// Rating substrings that mark a record as restricted (explicit and borderline tiers)
pub const RESTRICTED_RATING_MARKERS: [&str; 2] = ["Rx", "R+"];

/// `rating` query values that would ask upstream for restricted content
const RESTRICTED_RATING_FILTERS: [&str; 2] = ["rx", "r"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPolicy {
    blocked_genres: BTreeSet<u32>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            blocked_genres: BLOCKED_GENRES.into_iter().collect(),
        }
    }
}

impl ContentPolicy {
    /// Blocklist widened with extra codes; the built-in codes always stay
    pub fn with_extra_genres(extra: impl IntoIterator<Item = u32>) -> Self {
        let mut policy = Self::default();
        policy.blocked_genres.extend(extra);
        policy
    }

    pub fn blocked_genres(&self) -> impl Iterator<Item = u32> + '_ {
        self.blocked_genres.iter().copied()
    }

    /// Copy of `spec` with `sfw` forced on and the exclusion list merged with
    /// the blocklist. A caller's own exclusions are kept (union), never
    /// replaced, and never able to narrow the blocklist. Blocked codes are
    /// dropped from the inclusion list, as is a restricted `rating` filter.
    pub fn augment_outbound(&self, spec: &FilterSpec) -> FilterSpec {
        let mut outbound = spec.clone();
        outbound.sfw = Some(true);

        let excluded: BTreeSet<u32> = spec
            .genres_exclude
            .iter()
            .copied()
            .chain(self.blocked_genres.iter().copied())
            .collect();
        outbound.genres_exclude = excluded.into_iter().collect();

        outbound
            .genres
            .retain(|code| !self.blocked_genres.contains(code));

        if outbound.rating.as_deref().is_some_and(|r| {
            RESTRICTED_RATING_FILTERS
                .iter()
                .any(|restricted| r.trim().eq_ignore_ascii_case(restricted))
        }) {
            tracing::debug!(rating = ?spec.rating, "Dropping restricted rating filter");
            outbound.rating = None;
        }

        outbound
    }

    pub fn is_record_safe(&self, item: &CatalogItem) -> bool {
        is_rating_safe(item.rating.as_deref())
    }

    /// Reject a detail record that fails [`Self::is_record_safe`]
    pub fn check_record(&self, kind: CatalogKind, item: &CatalogItem) -> CatalogResult<()> {
        if self.is_record_safe(item) {
            Ok(())
        } else {
            Err(CatalogError::PolicyViolation {
                kind,
                id: item.mal_id,
                rating: item.rating.clone().unwrap_or_default(),
            })
        }
    }
}

/// False when the rating carries a restricted marker. Absent and empty
/// ratings are safe.
pub fn is_rating_safe(rating: Option<&str>) -> bool {
    let rating = rating.unwrap_or_default();
    !RESTRICTED_RATING_MARKERS
        .iter()
        .any(|marker| rating.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_rated(rating: Option<&str>) -> CatalogItem {
        CatalogItem {
            mal_id: 1,
            title: "t".to_string(),
            title_japanese: None,
            rating: rating.map(str::to_string),
            genres: Vec::new(),
            image_url: None,
            score: None,
            entry_type: None,
        }
    }

    fn is_superset_of_blocklist(spec: &FilterSpec) -> bool {
        BLOCKED_GENRES.iter().all(|code| spec.genres_exclude.contains(code))
    }

    #[test]
    fn test_empty_spec_gets_sfw_and_blocklist() {
        let outbound = ContentPolicy::default().augment_outbound(&FilterSpec::default());
        assert_eq!(outbound.sfw, Some(true));
        assert_eq!(outbound.genres_exclude, vec![12, 26, 28, 49]);
    }

    #[test]
    fn test_caller_exclusions_are_merged() {
        let spec = FilterSpec {
            genres_exclude: vec![14, 12, 7],
            ..Default::default()
        };
        let outbound = ContentPolicy::default().augment_outbound(&spec);
        assert_eq!(outbound.genres_exclude, vec![7, 12, 14, 26, 28, 49]);
    }

    #[test]
    fn test_caller_cannot_disable_safe_mode() {
        let spec = FilterSpec {
            sfw: Some(false),
            genres: vec![1, 12, 49],
            rating: Some("RX".to_string()),
            ..Default::default()
        };
        let outbound = ContentPolicy::default().augment_outbound(&spec);
        assert_eq!(outbound.sfw, Some(true));
        assert_eq!(outbound.genres, vec![1]);
        assert_eq!(outbound.rating, None);
        assert!(is_superset_of_blocklist(&outbound));
    }

    #[test]
    fn test_safe_rating_filter_kept() {
        let spec = FilterSpec {
            rating: Some("pg13".to_string()),
            ..Default::default()
        };
        let outbound = ContentPolicy::default().augment_outbound(&spec);
        assert_eq!(outbound.rating.as_deref(), Some("pg13"));
    }

    #[test]
    fn test_augment_always_superset() {
        let policy = ContentPolicy::default();
        let specs = [
            FilterSpec::default(),
            FilterSpec::page(9),
            FilterSpec { genres_exclude: vec![26], ..Default::default() },
            FilterSpec { genres_exclude: vec![1, 2, 3], sfw: Some(false), ..Default::default() },
            FilterSpec { query: Some("x".into()), genres: vec![12], ..Default::default() },
        ];
        for spec in &specs {
            let outbound = policy.augment_outbound(spec);
            assert_eq!(outbound.sfw, Some(true));
            assert!(is_superset_of_blocklist(&outbound), "{:?}", outbound);
        }
    }

    #[test]
    fn test_extra_genres_widen_blocklist() {
        let policy = ContentPolicy::with_extra_genres([9, 12]);
        assert_eq!(policy.blocked_genres().collect::<Vec<_>>(), vec![9, 12, 26, 28, 49]);
    }

    #[test]
    fn test_record_safety() {
        let policy = ContentPolicy::default();
        assert!(!policy.is_record_safe(&item_rated(Some("Rx - Hentai"))));
        assert!(!policy.is_record_safe(&item_rated(Some("R+ - Mild Nudity"))));
        assert!(policy.is_record_safe(&item_rated(Some("R - 17+ (violence & profanity)"))));
        assert!(policy.is_record_safe(&item_rated(Some("PG-13 - Teens 13 or older"))));
        assert!(policy.is_record_safe(&item_rated(Some(""))));
        assert!(policy.is_record_safe(&item_rated(None)));
    }

    #[test]
    fn test_check_record_rejects_with_policy_violation() {
        let policy = ContentPolicy::default();
        let err = policy
            .check_record(CatalogKind::Manga, &item_rated(Some("Rx - Hentai")))
            .unwrap_err();
        assert!(matches!(err, CatalogError::PolicyViolation { id: 1, .. }));
    }
}
