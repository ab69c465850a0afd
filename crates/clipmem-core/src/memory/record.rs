//! Memory records and recall outputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{CaptureContext, ContentFormat};

/// Prefix of ids for records not tied to a stored item
pub const MEMORY_ID_PREFIX: &str = "mem_";

/// A learned clipboard entry in the similarity graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Item id when learned from the store, otherwise `mem_<uuid>`
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentFormat,
    /// Derived tags
    pub tags: Vec<String>,
    pub context: CaptureContext,
    /// 0.0 to 1.0
    pub importance: f64,
    /// Records similar at insertion time (directional, may be stale)
    pub relationships: Vec<String>,
    pub accessed_count: u32,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Fresh `mem_` id
    pub fn generate_id() -> String {
        format!("{}{}", MEMORY_ID_PREFIX, uuid::Uuid::new_v4())
    }

    pub fn is_related_to(&self, id: &str) -> bool {
        self.relationships.iter().any(|r| r == id)
    }
}

/// Kind of suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Content similar to the input
    Similar,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Similar => "similar",
        }
    }
}

/// Past content offered in response to an input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub confidence: f64,
}

/// Content the user is likely to want next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub content: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl Prediction {
    pub fn new(content: impl Into<String>, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
        }
    }
}
