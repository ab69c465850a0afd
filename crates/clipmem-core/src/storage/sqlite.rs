//! SQLite Persistence Backend
//!
//! Clipboard history persisted in a single SQLite file with WAL journaling.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;

use super::backend::{PersistenceBackend, Result, StorageError};
use crate::item::{ClipboardItem, ContentFormat, ItemMetadata};

/// Database file name inside the data directory
pub const DB_FILE_NAME: &str = "clipmem.db";

const ITEM_COLUMNS: &str = "id, content, format, timestamp, metadata, tags, is_favorite, is_hidden";
const METADATA_COLUMN: usize = 4;
const TAGS_COLUMN: usize = 5;

// ============================================================================
// BACKEND
// ============================================================================

/// SQLite-backed item persistence
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, so the backend can be shared as
/// `Arc<dyn PersistenceBackend>`.
pub struct SqliteBackend {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteBackend {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;
             PRAGMA journal_size_limit = 67108864;",
        )?;
        Ok(())
    }

    /// Default database location under the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "clipmem", "clipmem").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join(DB_FILE_NAME))
    }

    /// Open (or create) the database, applying pending migrations
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                // Clipboard history may contain secrets: owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
                }
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600));
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "History database migrated");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version currently applied
    pub fn schema_version(&self) -> Result<u32> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        Ok(super::migrations::get_current_version(&reader)?)
    }

    /// Checkpoint the WAL and copy the database file to `output`.
    ///
    /// Returns the size of the copy in bytes.
    pub fn backup_to(&self, output: &Path) -> Result<u64> {
        {
            let writer = self
                .writer
                .lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            writer.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::copy(&self.path, output)?;
        }
        let size = std::fs::metadata(output)?.len();
        tracing::info!(path = %output.display(), bytes = size, "History database backed up");
        Ok(size)
    }

    /// Decode a JSON column. A bad value fails the row instead of
    /// defaulting, so a corrupt `sensitive` flag never reads back as false.
    fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
        let value: serde_json::Value = row.get(idx)?;
        serde_json::from_value(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    /// Convert a row selected with `ITEM_COLUMNS` to a ClipboardItem
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ClipboardItem> {
        let format: String = row.get("format")?;
        let metadata: ItemMetadata = Self::json_column(row, METADATA_COLUMN)?;
        let tags: Vec<String> = Self::json_column(row, TAGS_COLUMN)?;

        Ok(ClipboardItem {
            id: row.get("id")?,
            content: row.get("content")?,
            format: ContentFormat::parse_name(&format),
            timestamp: row.get::<_, DateTime<Utc>>("timestamp")?,
            metadata,
            tags,
            favorite: row.get::<_, i64>("is_favorite")? != 0,
            hidden: row.get::<_, i64>("is_hidden")? != 0,
        })
    }
}

impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load_all(&self) -> Result<Vec<ClipboardItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM clipboard_items ORDER BY timestamp DESC",
            ITEM_COLUMNS
        ))?;

        let mut items = Vec::new();
        for row in stmt.query_map([], Self::row_to_item)? {
            match row {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping unreadable history row: {}", e),
            }
        }
        Ok(items)
    }

    fn put(&self, item: &ClipboardItem) -> Result<()> {
        let metadata = serde_json::to_value(&item.metadata)?;
        let tags = serde_json::to_value(&item.tags)?;

        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT OR REPLACE INTO clipboard_items
                (id, content, format, timestamp, metadata, tags, is_favorite, is_hidden)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                item.content,
                item.format.as_str(),
                item.timestamp,
                metadata,
                tags,
                item.favorite as i64,
                item.hidden as i64,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ClipboardItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let item = reader
            .query_row(
                &format!("SELECT {} FROM clipboard_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                Self::row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let rows = writer.execute("DELETE FROM clipboard_items WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn clear(&self) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute("DELETE FROM clipboard_items", [])?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
