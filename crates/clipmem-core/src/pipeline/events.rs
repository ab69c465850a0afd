//! Pipeline events
//!
//! Published on a tokio broadcast channel after each pipeline transition
//! that a UI layer cares about.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::memory::Suggestion;

/// Every completed capture or maintenance pass emits one of these
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    // -- Capture --
    ItemCaptured {
        item_id: String,
        /// Stored content, or its masked preview for sensitive items
        original: String,
        format: String,
        tags: Vec<String>,
        /// At most three similar past items
        suggestions: Vec<Suggestion>,
        timestamp: DateTime<Utc>,
    },
    DuplicateSkipped {
        existing_id: String,
        timestamp: DateTime<Utc>,
    },
    ItemsEvicted {
        ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    CaptureFailed {
        stage: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    // -- History mutations --
    ItemDeleted {
        id: String,
        timestamp: DateTime<Utc>,
    },
    HistoryCleared {
        timestamp: DateTime<Utc>,
    },

    // -- Maintenance --
    MaintenanceCompleted {
        expired: usize,
        indexed_items: usize,
        memory_records: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// Variant name, as it appears in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::ItemCaptured { .. } => "ItemCaptured",
            PipelineEvent::DuplicateSkipped { .. } => "DuplicateSkipped",
            PipelineEvent::ItemsEvicted { .. } => "ItemsEvicted",
            PipelineEvent::CaptureFailed { .. } => "CaptureFailed",
            PipelineEvent::ItemDeleted { .. } => "ItemDeleted",
            PipelineEvent::HistoryCleared { .. } => "HistoryCleared",
            PipelineEvent::MaintenanceCompleted { .. } => "MaintenanceCompleted",
        }
    }

    /// Serialize to a JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
