//! Search Module
//!
//! Inverted index over clipboard history:
//! - Token and `tag:`/`format:` facet keys
//! - Prefix suggestions, including saved searches
//! - Relevance-ranked queries with an LRU result cache

mod index;
mod ranking;

pub use index::{
    FORMAT_PREFIX, IndexStats, SAVED_PREFIX, SavedSearch, SearchConfig, SearchFilters, SearchIndex,
    TAG_PREFIX,
};
pub use ranking::{
    CONTAINS_SCORE, EARLY_MATCH_SCORE, EXACT_SCORE, FRESH_SCORE, RECENT_SCORE, SearchResult,
    SortBy, TAG_SCORE, score_item, sort_results,
};
