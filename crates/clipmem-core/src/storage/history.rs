//! History Store
//!
//! Bounded, newest-first collection of clipboard items:
//! - Full-store duplicate suppression on (content, format)
//! - Capacity eviction (oldest first) and age-based auto-delete
//! - Pagination, tag lookup and substring search
//! - Write-through to a `PersistenceBackend`
//! - JSON export / import

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::backend::{MemoryBackend, PersistenceBackend, Result, StorageError};
use crate::item::{ClipboardItem, Page, PageRequest, SaveOutcome, StoreStats};

/// Current export document version
pub const EXPORT_VERSION: u32 = 1;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// History store limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of items kept (at least 1)
    pub max_size: usize,
    /// Items older than this many days are removed by maintenance
    pub auto_delete_after_days: Option<u32>,
    /// Reject items whose (content, format) already exists
    pub duplicate_detection: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            auto_delete_after_days: None,
            duplicate_detection: true,
        }
    }
}

// ============================================================================
// EXPORT FORMAT
// ============================================================================

/// On-disk export document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub items: Vec<ClipboardItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Document(ExportDocument),
    Items(Vec<ClipboardItem>),
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Items written
    pub imported: usize,
    /// Items skipped as duplicates
    pub duplicates: usize,
    /// Items evicted to stay within capacity
    pub evicted: usize,
}

// ============================================================================
// STORE
// ============================================================================

struct StoreState {
    /// Newest first
    items: Vec<ClipboardItem>,
    config: HistoryConfig,
}

/// Bounded clipboard history with write-through persistence
///
/// One mutex covers the duplicate check, the backend write, the insertion
/// and the eviction, so no reader ever sees more than `max_size` items.
pub struct HistoryStore {
    backend: Arc<dyn PersistenceBackend>,
    state: Mutex<StoreState>,
}

impl HistoryStore {
    /// Open a store over a backend, loading and bounding persisted items
    pub fn open(backend: Arc<dyn PersistenceBackend>, mut config: HistoryConfig) -> Result<Self> {
        config.max_size = config.max_size.max(1);

        let mut items = backend.load_all()?;
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let store = Self {
            backend,
            state: Mutex::new(StoreState { items, config }),
        };

        {
            let mut state = store.lock();
            let evicted = store.evict_over_capacity(&mut state);
            tracing::info!(
                backend = store.backend.name(),
                items = state.items.len(),
                evicted = evicted.len(),
                "History store opened"
            );
        }

        Ok(store)
    }

    /// Ephemeral store backed by memory
    pub fn in_memory(config: HistoryConfig) -> Self {
        let mut config = config;
        config.max_size = config.max_size.max(1);
        Self {
            backend: Arc::new(MemoryBackend::new()),
            state: Mutex::new(StoreState {
                items: Vec::new(),
                config,
            }),
        }
    }

    // Item vectors stay consistent across a panic (mutations are single
    // Vec operations after the backend call), so poisoning is recoverable.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove oldest items until within capacity; returns evicted ids
    fn evict_over_capacity(&self, state: &mut StoreState) -> Vec<String> {
        let mut evicted = Vec::new();
        while state.items.len() > state.config.max_size {
            let Some(oldest) = state.items.pop() else { break };
            if let Err(e) = self.backend.delete(&oldest.id) {
                tracing::warn!(id = %oldest.id, "Failed to delete evicted item from backend: {}", e);
            }
            evicted.push(oldest.id);
        }
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "Evicted items over capacity");
        }
        evicted
    }

    /// Save an item.
    ///
    /// Duplicates are reported, not errors. The backend is written before
    /// the in-memory view changes, so a failed write leaves no trace.
    pub fn save(&self, item: ClipboardItem) -> Result<SaveOutcome> {
        let mut state = self.lock();

        if state.config.duplicate_detection {
            if let Some(existing) = state.items.iter().find(|e| e.is_duplicate_of(&item)) {
                return Ok(SaveOutcome::Duplicate {
                    existing_id: existing.id.clone(),
                });
            }
        }

        self.backend.put(&item)?;

        let id = item.id.clone();
        if let Some(pos) = state.items.iter().position(|e| e.id == id) {
            state.items.remove(pos);
        }
        let at = state
            .items
            .partition_point(|e| e.timestamp > item.timestamp);
        state.items.insert(at, item);

        let evicted = self.evict_over_capacity(&mut state);
        Ok(SaveOutcome::Saved { id, evicted })
    }

    /// Item by id
    pub fn get(&self, id: &str) -> Option<ClipboardItem> {
        self.lock().items.iter().find(|i| i.id == id).cloned()
    }

    /// All items, newest first
    pub fn get_all(&self) -> Vec<ClipboardItem> {
        self.lock().items.clone()
    }

    /// Slice of the newest-first ordering plus the total count
    pub fn get_paginated(&self, page: PageRequest) -> Page {
        let state = self.lock();
        let items = state
            .items
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect();
        Page {
            items,
            total: state.items.len(),
        }
    }

    /// Case-insensitive substring match on content, newest first
    pub fn search(&self, query: &str) -> Vec<ClipboardItem> {
        let needle = query.to_lowercase();
        self.lock()
            .items
            .iter()
            .filter(|i| i.content.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Items carrying an exact tag, newest first
    pub fn get_by_tag(&self, tag: &str) -> Vec<ClipboardItem> {
        self.lock()
            .items
            .iter()
            .filter(|i| i.has_tag(tag))
            .cloned()
            .collect()
    }

    /// Favorite items, newest first
    pub fn get_favorites(&self) -> Vec<ClipboardItem> {
        self.lock()
            .items
            .iter()
            .filter(|i| i.favorite)
            .cloned()
            .collect()
    }

    /// Delete an item. Deleting a missing id is not an error.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();
        let Some(pos) = state.items.iter().position(|i| i.id == id) else {
            return Ok(false);
        };
        self.backend.delete(id)?;
        state.items.remove(pos);
        Ok(true)
    }

    /// Remove every item
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock();
        self.backend.clear()?;
        state.items.clear();
        tracing::info!("History cleared");
        Ok(())
    }

    /// Change capacity (minimum 1), evicting immediately
    pub fn set_max_size(&self, max_size: usize) -> Vec<String> {
        let mut state = self.lock();
        state.config.max_size = max_size.max(1);
        self.evict_over_capacity(&mut state)
    }

    /// Current capacity
    pub fn max_size(&self) -> usize {
        self.lock().config.max_size
    }

    /// Enable or disable duplicate suppression
    pub fn set_duplicate_detection(&self, enabled: bool) {
        self.lock().config.duplicate_detection = enabled;
    }

    /// Change the age limit used by maintenance. `Some(0)` disables it.
    pub fn set_auto_delete_after_days(&self, days: Option<u32>) {
        self.lock().config.auto_delete_after_days = days.filter(|d| *d > 0);
    }

    /// Current configuration
    pub fn config(&self) -> HistoryConfig {
        self.lock().config.clone()
    }

    /// Remove items older than the configured age limit; returns removed ids
    pub fn run_maintenance(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let mut state = self.lock();
        let Some(days) = state.config.auto_delete_after_days.filter(|d| *d > 0) else {
            return Ok(vec![]);
        };
        let cutoff = now - Duration::days(i64::from(days));

        let expired: Vec<String> = state
            .items
            .iter()
            .filter(|i| i.timestamp < cutoff)
            .map(|i| i.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            self.backend.delete(&id)?;
            state.items.retain(|i| i.id != id);
            removed.push(id);
        }

        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), days, "Auto-deleted expired items");
        }
        Ok(removed)
    }

    /// Apply a mutation to one item and persist it
    fn update<F>(&self, id: &str, mutate: F) -> Result<ClipboardItem>
    where
        F: FnOnce(&mut ClipboardItem),
    {
        let mut state = self.lock();
        let pos = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let mut updated = state.items[pos].clone();
        mutate(&mut updated);
        self.backend.put(&updated)?;
        state.items[pos] = updated.clone();
        Ok(updated)
    }

    /// Add a user tag; returns whether it was new
    pub fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let mut added = false;
        self.update(id, |item| added = item.add_tag(tag))?;
        Ok(added)
    }

    /// Remove a user tag; returns whether it was present
    pub fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let mut removed = false;
        self.update(id, |item| removed = item.remove_tag(tag))?;
        Ok(removed)
    }

    /// Flip the favorite flag; returns the new value
    pub fn toggle_favorite(&self, id: &str) -> Result<bool> {
        Ok(self.update(id, |item| item.favorite = !item.favorite)?.favorite)
    }

    /// Set the hidden flag
    pub fn set_hidden(&self, id: &str, hidden: bool) -> Result<()> {
        self.update(id, |item| item.hidden = hidden)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Counts by format and flag, plus the time range
    pub fn stats(&self) -> StoreStats {
        let state = self.lock();
        let mut stats = StoreStats {
            total_items: state.items.len(),
            max_size: state.config.max_size,
            newest_item: state.items.first().map(|i| i.timestamp),
            oldest_item: state.items.last().map(|i| i.timestamp),
            ..Default::default()
        };
        for item in &state.items {
            *stats
                .by_format
                .entry(item.format.as_str().to_string())
                .or_insert(0) += 1;
            if item.metadata.sensitive {
                stats.sensitive_items += 1;
            }
            if item.favorite {
                stats.favorite_items += 1;
            }
        }
        stats
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    /// Write the history to a JSON file; returns the number of items written.
    ///
    /// Sensitive items are left out unless `include_sensitive` is set.
    pub fn export_json(&self, path: &Path, include_sensitive: bool) -> Result<usize> {
        let items: Vec<ClipboardItem> = self
            .get_all()
            .into_iter()
            .filter(|i| include_sensitive || !i.is_masked())
            .collect();

        let document = ExportDocument {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            items,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;

        tracing::info!(count = document.items.len(), path = %path.display(), "History exported");
        Ok(document.items.len())
    }

    /// Load items from an export file through `save`, so duplicate
    /// suppression and the capacity bound still apply.
    pub fn import_json(&self, path: &Path) -> Result<ImportReport> {
        let raw = std::fs::read_to_string(path)?;
        let mut items = match serde_json::from_str::<ImportPayload>(&raw)? {
            ImportPayload::Document(doc) => doc.items,
            ImportPayload::Items(items) => items,
        };
        // Oldest first, so capacity eviction keeps the newest
        items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut report = ImportReport::default();
        for mut item in items {
            if self.get(&item.id).is_some() {
                item.id = uuid::Uuid::new_v4().to_string();
            }
            match self.save(item)? {
                SaveOutcome::Saved { evicted, .. } => {
                    report.imported += 1;
                    report.evicted += evicted.len();
                }
                SaveOutcome::Duplicate { .. } => report.duplicates += 1,
            }
        }

        tracing::info!(
            imported = report.imported,
            duplicates = report.duplicates,
            path = %path.display(),
            "History imported"
        );
        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================
