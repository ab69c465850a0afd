//! Inverted Search Index
//!
//! Token and facet keys map to ordered sets of item ids:
//! - word tokens longer than two characters, lower-cased
//! - `tag:<tag>` and `format:<format>` facets
//!
//! Sensitive and masked items are never indexed. The index is a derived
//! cache and can always be rebuilt from the history store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::ranking::{SearchResult, SortBy, score_item, sort_results};
use crate::content::tokenize;
use crate::item::{ClipboardItem, ContentFormat};

/// Key prefix for tag facets
pub const TAG_PREFIX: &str = "tag:";
/// Key prefix for format facets
pub const FORMAT_PREFIX: &str = "format:";
/// Prefix of saved search suggestions
pub const SAVED_PREFIX: &str = "saved:";

const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(128) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

// ============================================================================
// TYPES
// ============================================================================

/// Query filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Keep items carrying any of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Keep items of any of these formats
    #[serde(default)]
    pub formats: Vec<ContentFormat>,
    /// Maximum results
    #[serde(default)]
    pub limit: Option<usize>,
    /// Result ordering
    #[serde(default)]
    pub sort: SortBy,
}

impl SearchFilters {
    fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.formats.is_empty()
    }

    fn admits(&self, item: &ClipboardItem) -> bool {
        let tag_ok = self.tags.is_empty()
            || self
                .tags
                .iter()
                .any(|t| item.tags.iter().any(|tag| same_tag(t, tag)));
        tag_ok && (self.formats.is_empty() || self.formats.contains(&item.format))
    }
}

/// Tag filters compare the way `tag:` keys are indexed, case-insensitively
pub(crate) fn same_tag(filter: &str, tag: &str) -> bool {
    filter == tag || filter.to_lowercase() == tag.to_lowercase()
}

/// A named query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub name: String,
    pub query: String,
    pub filters: SearchFilters,
    pub created_at: DateTime<Utc>,
}

/// Index statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Distinct token and facet keys
    pub keys: usize,
    /// Indexed items
    pub items: usize,
    /// Saved searches
    pub saved_searches: usize,
    /// Cached query results
    pub cached_queries: usize,
}

/// Index configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Query results kept in the LRU cache
    pub cache_capacity: NonZeroUsize,
    /// Maximum suggestions returned
    pub suggestion_limit: usize,
    /// Shorter prefixes get no suggestions
    pub min_prefix_chars: usize,
    /// Result limit when filters leave it unset
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            suggestion_limit: 10,
            min_prefix_chars: 2,
            default_limit: 50,
        }
    }
}

#[derive(Default)]
struct IndexState {
    postings: BTreeMap<String, BTreeSet<String>>,
    items: HashMap<String, ClipboardItem>,
    saved: BTreeMap<String, SavedSearch>,
}

impl IndexState {
    fn insert(&mut self, item: &ClipboardItem) {
        for key in index_keys(item) {
            self.postings.entry(key).or_default().insert(item.id.clone());
        }
        self.items.insert(item.id.clone(), item.clone());
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(item) = self.items.remove(id) else {
            return false;
        };
        for key in index_keys(&item) {
            if let Some(ids) = self.postings.get_mut(&key) {
                ids.remove(id);
                if ids.is_empty() {
                    self.postings.remove(&key);
                }
            }
        }
        true
    }
}

/// Keys an item is indexed under
fn index_keys(item: &ClipboardItem) -> BTreeSet<String> {
    let mut keys: BTreeSet<String> = tokenize(&item.content).into_iter().collect();
    for tag in &item.tags {
        keys.insert(format!("{}{}", TAG_PREFIX, tag.to_lowercase()));
    }
    keys.insert(format!("{}{}", FORMAT_PREFIX, item.format.as_str()));
    keys
}

// ============================================================================
// SEARCH INDEX
// ============================================================================

/// Inverted index with prefix suggestions and ranked queries
pub struct SearchIndex {
    config: SearchConfig,
    state: Mutex<IndexState>,
    cache: Mutex<LruCache<String, Vec<SearchResult>>>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let cache = LruCache::new(config.cache_capacity);
        Self {
            config,
            state: Mutex::new(IndexState::default()),
            cache: Mutex::new(cache),
        }
    }

    fn state(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn invalidate_cache(&self) {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    /// Rebuild from scratch. Saved searches survive.
    pub fn build(&self, items: &[ClipboardItem]) {
        let mut state = self.state();
        state.postings.clear();
        state.items.clear();
        let mut skipped = 0usize;
        for item in items {
            if item.is_masked() {
                skipped += 1;
                continue;
            }
            state.insert(item);
        }
        tracing::debug!(
            items = state.items.len(),
            keys = state.postings.len(),
            skipped_sensitive = skipped,
            "Search index rebuilt"
        );
        drop(state);
        self.invalidate_cache();
    }

    /// Index (or re-index) one item; masked items are ignored
    pub fn add(&self, item: &ClipboardItem) -> bool {
        if item.is_masked() {
            return false;
        }
        {
            let mut state = self.state();
            state.remove(&item.id);
            state.insert(item);
        }
        self.invalidate_cache();
        true
    }

    /// Drop one item from the index
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.state().remove(id);
        if removed {
            self.invalidate_cache();
        }
        removed
    }

    /// Ids stored under an exact key
    pub fn lookup(&self, key: &str) -> Vec<String> {
        self.state()
            .postings
            .get(&key.to_lowercase())
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Up to the suggestion limit of keys starting with the prefix,
    /// followed by saved searches whose name or query contains it
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.chars().count() < self.config.min_prefix_chars {
            return vec![];
        }

        let state = self.state();
        let mut suggestions: Vec<String> = state
            .postings
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .take(self.config.suggestion_limit)
            .map(|(key, _)| key.clone())
            .collect();

        for saved in state.saved.values() {
            if suggestions.len() >= self.config.suggestion_limit {
                break;
            }
            if saved.name.to_lowercase().contains(&prefix)
                || saved.query.to_lowercase().contains(&prefix)
            {
                let key = format!("{}{}", SAVED_PREFIX, saved.name);
                if !suggestions.contains(&key) {
                    suggestions.push(key);
                }
            }
        }

        suggestions
    }

    /// Ranked search at the current time
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchResult> {
        self.query(query, filters, Utc::now())
    }

    /// Ranked search relative to `now`.
    ///
    /// Candidates contain the query, carry a tag containing it, or hold every
    /// query token. An empty query with filters lists every admitted item.
    pub fn query(&self, query: &str, filters: &SearchFilters, now: DateTime<Utc>) -> Vec<SearchResult> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() && filters.is_empty() {
            return vec![];
        }

        let cache_key = format!(
            "{}\u{1f}{:?}\u{1f}{}",
            query_lower,
            filters,
            now.timestamp() / 60
        );
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&cache_key)
        {
            return hit.clone();
        }

        let mut results: Vec<SearchResult> = {
            let state = self.state();
            let tokens = tokenize(&query_lower);

            // Items holding every query token
            let token_hits: Option<BTreeSet<&String>> = if tokens.is_empty() {
                None
            } else {
                let mut sets = tokens.iter().map(|t| {
                    state
                        .postings
                        .get(t)
                        .map(|ids| ids.iter().collect::<BTreeSet<_>>())
                        .unwrap_or_default()
                });
                let first = sets.next().unwrap_or_default();
                Some(sets.fold(first, |acc, set| acc.intersection(&set).copied().collect()))
            };

            state
                .items
                .values()
                .filter(|item| filters.admits(item))
                .filter(|item| {
                    query_lower.is_empty()
                        || item.content.to_lowercase().contains(&query_lower)
                        || item.tags.iter().any(|t| t.to_lowercase().contains(&query_lower))
                        || token_hits.as_ref().is_some_and(|hits| hits.contains(&item.id))
                })
                .map(|item| SearchResult {
                    score: score_item(item, &query_lower, filters, now),
                    item: item.clone(),
                })
                .collect()
        };

        sort_results(&mut results, filters.sort, false);
        results.truncate(filters.limit.unwrap_or(self.config.default_limit));

        tracing::debug!(query = %query_lower, results = results.len(), "Search completed");

        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .put(cache_key, results.clone());
        results
    }

    // ========================================================================
    // SAVED SEARCHES
    // ========================================================================

    /// Save (or replace) a named query
    pub fn save_search(&self, name: &str, query: &str, filters: SearchFilters) -> SavedSearch {
        let saved = SavedSearch {
            name: name.trim().to_string(),
            query: query.to_string(),
            filters,
            created_at: Utc::now(),
        };
        self.state().saved.insert(saved.name.clone(), saved.clone());
        tracing::info!(name = %saved.name, query = %saved.query, "Search saved");
        saved
    }

    /// Saved query by name
    pub fn load_saved_search(&self, name: &str) -> Option<SavedSearch> {
        self.state().saved.get(name.trim()).cloned()
    }

    /// Run a saved query
    pub fn run_saved_search(&self, name: &str, now: DateTime<Utc>) -> Option<Vec<SearchResult>> {
        let saved = self.load_saved_search(name)?;
        Some(self.query(&saved.query, &saved.filters, now))
    }

    /// Delete a saved query
    pub fn delete_saved_search(&self, name: &str) -> bool {
        self.state().saved.remove(name.trim()).is_some()
    }

    /// All saved queries, by name
    pub fn saved_searches(&self) -> Vec<SavedSearch> {
        self.state().saved.values().cloned().collect()
    }

    /// Replace saved queries (e.g. after loading them from disk)
    pub fn restore_saved_searches(&self, searches: Vec<SavedSearch>) {
        let mut state = self.state();
        state.saved = searches.into_iter().map(|s| (s.name.clone(), s)).collect();
    }

    pub fn stats(&self) -> IndexStats {
        let cached_queries = self.cache.lock().unwrap_or_else(|p| p.into_inner()).len();
        let state = self.state();
        IndexStats {
            keys: state.postings.len(),
            items: state.items.len(),
            saved_searches: state.saved.len(),
            cached_queries,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
