//! Storage Module
//!
//! Clipboard history storage with:
//! - Bounded, deduplicated, newest-first history store
//! - Pluggable persistence (SQLite with migrations, or in-memory)
//! - JSON export and import

mod backend;
mod history;
mod migrations;
mod sqlite;

pub use backend::{MemoryBackend, PersistenceBackend, Result, StorageError};
pub use history::{EXPORT_VERSION, ExportDocument, HistoryConfig, HistoryStore, ImportReport};
pub use migrations::MIGRATIONS;
pub use sqlite::{DB_FILE_NAME, SqliteBackend};
