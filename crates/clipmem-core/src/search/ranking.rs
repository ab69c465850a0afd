//! Relevance scoring
//!
//! Additive heuristic over substring position, exactness, recency and tags.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SearchFilters;
use super::index::same_tag;
use crate::item::ClipboardItem;

/// Content contains the query
pub const CONTAINS_SCORE: u32 = 100;
/// Match begins within the first `EARLY_MATCH_CHARS` characters
pub const EARLY_MATCH_SCORE: u32 = 50;
/// Whole content equals the query
pub const EXACT_SCORE: u32 = 200;
/// Captured less than a day ago
pub const FRESH_SCORE: u32 = 100;
/// Captured less than a week ago
pub const RECENT_SCORE: u32 = 50;
/// A tag contains the query or is in the active tag filter
pub const TAG_SCORE: u32 = 75;

/// Window for the early-match bonus
pub const EARLY_MATCH_CHARS: usize = 50;

/// A scored search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub item: ClipboardItem,
    pub score: u32,
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Score descending, newer first on ties
    #[default]
    Relevance,
    /// Timestamp
    Date,
    /// Content length in characters
    Length,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
            SortBy::Length => "length",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relevance" => Some(SortBy::Relevance),
            "date" => Some(SortBy::Date),
            "length" => Some(SortBy::Length),
            _ => None,
        }
    }
}

/// Score an item against a lower-cased query
pub fn score_item(
    item: &ClipboardItem,
    query_lower: &str,
    filters: &SearchFilters,
    now: DateTime<Utc>,
) -> u32 {
    let mut score = 0;

    if !query_lower.is_empty() {
        let content = item.content.to_lowercase();
        if let Some(byte_idx) = content.find(query_lower) {
            score += CONTAINS_SCORE;
            if content[..byte_idx].chars().count() < EARLY_MATCH_CHARS {
                score += EARLY_MATCH_SCORE;
            }
            if content == query_lower {
                score += EXACT_SCORE;
            }
        }
    }

    let age_days = item.age_days(now);
    if age_days < 1.0 {
        score += FRESH_SCORE;
    } else if age_days < 7.0 {
        score += RECENT_SCORE;
    }

    let tag_hit = item.tags.iter().any(|tag| {
        (!query_lower.is_empty() && tag.to_lowercase().contains(query_lower))
            || filters.tags.iter().any(|t| same_tag(t, tag))
    });
    if tag_hit {
        score += TAG_SCORE;
    }

    score
}

/// Relevance order: score descending, then newer first
pub fn by_relevance(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.item.timestamp.cmp(&a.item.timestamp))
}

/// Sort results in place
pub fn sort_results(results: &mut [SearchResult], sort: SortBy, ascending: bool) {
    match sort {
        SortBy::Relevance => {
            results.sort_by(by_relevance);
            if ascending {
                results.reverse();
            }
        }
        SortBy::Date => results.sort_by(|a, b| {
            let ord = a.item.timestamp.cmp(&b.item.timestamp);
            if ascending { ord } else { ord.reverse() }
        }),
        SortBy::Length => results.sort_by(|a, b| {
            let ord = a
                .item
                .content
                .chars()
                .count()
                .cmp(&b.item.content.chars().count());
            if ascending { ord } else { ord.reverse() }
        }),
    }
}
