//! Persistence backends
//!
//! The history store writes through to a `PersistenceBackend`. Every method
//! is individually atomic; the store provides the cross-call ordering.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::item::ClipboardItem;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// BACKEND TRAIT
// ============================================================================

/// Durable home of clipboard items
pub trait PersistenceBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Load every persisted item (any order)
    fn load_all(&self) -> Result<Vec<ClipboardItem>>;

    /// Insert or replace an item
    fn put(&self, item: &ClipboardItem) -> Result<()>;

    /// Fetch one item
    fn get(&self, id: &str) -> Result<Option<ClipboardItem>>;

    /// Delete one item, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool>;

    /// Delete everything
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Backend that keeps items in a map, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, ClipboardItem>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ClipboardItem>>> {
        self.items
            .lock()
            .map_err(|_| StorageError::Init("Memory backend lock poisoned".into()))
    }
}

impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load_all(&self) -> Result<Vec<ClipboardItem>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn put(&self, item: &ClipboardItem) -> Result<()> {
        self.lock()?.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ClipboardItem>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.lock()?.remove(id).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
