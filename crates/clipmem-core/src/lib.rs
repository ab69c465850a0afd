//! # clipmem Core
//!
//! Clipboard memory engine. Watches a clipboard source and turns every copy
//! into a normalized, classified, searchable record:
//!
//! - **Watcher**: polls an abstract `ClipboardSource`, fires once per new value
//! - **Normalizer**: canonical text per format (text, markup, rich-text, code, link)
//! - **Classifier**: language, code language, link facts, sensitivity, derived tags
//! - **History Store**: bounded, deduplicated, paginated history over SQLite or memory
//! - **Search Index**: inverted index with facets, prefix suggestions and ranked queries
//! - **Memory Bank**: similarity graph over learned content with capture context
//! - **Predictive Engine**: time, application, pattern and memory signals merged
//!
//! `ClipboardPipeline` owns all of them and publishes `PipelineEvent`s.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clipmem_core::prelude::*;
//!
//! let source = Arc::new(ScriptedSource::from_contents(["fn main() {}"]));
//! let pipeline = ClipboardPipeline::in_memory(source, &Settings::default());
//!
//! pipeline.poll_once()?;
//! let results = pipeline.search("main", &SearchFilters::default());
//! let predictions = pipeline.get_predictions();
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite into the binary

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod content;
pub mod item;
pub mod memory;
pub mod pipeline;
pub mod prediction;
pub mod search;
pub mod storage;
pub mod watcher;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Items
pub use item::{
    CaptureContext, ClipboardItem, ContentFormat, ItemMetadata, Page, PageRequest, SaveOutcome,
    StoreStats, UNKNOWN,
};

// Content
pub use content::{ContentClassifier, FormattedContent, detect_type, normalize, prepare};

// Storage layer
pub use storage::{
    HistoryConfig, HistoryStore, ImportReport, MemoryBackend, PersistenceBackend, Result,
    SqliteBackend, StorageError,
};

// Search
pub use search::{SavedSearch, SearchFilters, SearchIndex, SearchResult, SortBy};

// Memory bank
pub use memory::{MemoryBank, MemoryBankConfig, MemoryInsights, MemoryRecord, Prediction, Suggestion};

// Prediction
pub use prediction::{PredictionError, PredictiveEngine, SignalGenerator};

// Watcher
pub use watcher::{ClipboardChange, ClipboardSnapshot, ClipboardSource, ClipboardWatcher, ScriptedSource, SourceError};

// Pipeline
pub use pipeline::{
    CaptureOutcome, ClipboardPipeline, MaintenanceReport, PipelineError, PipelineEvent, PipelineStage,
};

// Settings
pub use config::{Settings, SettingsError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CaptureContext, CaptureOutcome, ClipboardItem, ClipboardPipeline, ClipboardSource,
        ContentFormat, HistoryStore, PageRequest, PipelineEvent, Result, ScriptedSource,
        SearchFilters, SearchIndex, Settings, StorageError,
    };
}
