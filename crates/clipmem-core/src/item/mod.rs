//! Item module - Core clipboard types
//!
//! - Clipboard items with derived metadata, tags and flags
//! - Content formats
//! - Capture context (application, window, time of day)
//! - Store results (save outcomes, pages, statistics)

mod context;

pub use context::{CaptureContext, UNKNOWN, local_hour};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONTENT FORMAT
// ============================================================================

/// Canonical format of a clipboard item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ContentFormat {
    /// Plain text
    #[default]
    Text,
    /// HTML / XML markup
    Markup,
    /// RTF payload
    RichText,
    /// Source code snippet
    Code,
    /// A single URL
    Link,
    /// Reference to an image (path or data URI), content is not inlined
    ImageReference,
}

impl ContentFormat {
    /// All formats, in declaration order
    pub const ALL: [ContentFormat; 6] = [
        ContentFormat::Text,
        ContentFormat::Markup,
        ContentFormat::RichText,
        ContentFormat::Code,
        ContentFormat::Link,
        ContentFormat::ImageReference,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Text => "text",
            ContentFormat::Markup => "markup",
            ContentFormat::RichText => "rich-text",
            ContentFormat::Code => "code",
            ContentFormat::Link => "link",
            ContentFormat::ImageReference => "image-reference",
        }
    }

    /// Parse from string name, falling back to `Text` for unknown names
    pub fn parse_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "markup" | "html" | "xml" => ContentFormat::Markup,
            "rich-text" | "richtext" | "rich_text" | "rtf" => ContentFormat::RichText,
            "code" => ContentFormat::Code,
            "link" | "url" => ContentFormat::Link,
            "image-reference" | "image" | "image_reference" => ContentFormat::ImageReference,
            _ => ContentFormat::Text,
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// Facts derived from an item's content at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Length in bytes
    pub length: usize,
    /// Length in characters
    pub char_count: usize,
    /// Whitespace-delimited token count
    pub word_count: usize,
    /// Coarse script-based language ("english", "arabic", ...)
    pub language: String,
    /// Best-effort programming language for code items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_language: Option<String>,
    /// Content looks like a credential or other secret
    #[serde(default)]
    pub sensitive: bool,
    /// Content must only be displayed masked
    #[serde(default)]
    pub masked: bool,
    /// Application the content was copied from
    pub application: String,
    /// Window title at capture time
    pub window_title: String,
    /// Host for link items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether a link item uses https
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Tags inferred from the content (not user tags)
    #[serde(default)]
    pub derived_tags: Vec<String>,
    /// Free-form extensions
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

impl Default for ItemMetadata {
    fn default() -> Self {
        Self {
            length: 0,
            char_count: 0,
            word_count: 0,
            language: UNKNOWN.to_string(),
            code_language: None,
            sensitive: false,
            masked: false,
            application: UNKNOWN.to_string(),
            window_title: UNKNOWN.to_string(),
            domain: None,
            secure: None,
            derived_tags: vec![],
            extensions: BTreeMap::new(),
        }
    }
}

// ============================================================================
// CLIPBOARD ITEM
// ============================================================================

/// A captured, normalized and classified clipboard entry
///
/// Content, format and timestamp never change after creation. Only tags and
/// the favorite/hidden flags may be updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardItem {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Canonical content after normalization
    pub content: String,
    /// Canonical format
    pub format: ContentFormat,
    /// Capture instant
    pub timestamp: DateTime<Utc>,
    /// Derived metadata
    pub metadata: ItemMetadata,
    /// Ordered, unique labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Marked as favorite by the user
    #[serde(default)]
    pub favorite: bool,
    /// Hidden from default listings
    #[serde(default)]
    pub hidden: bool,
}

impl ClipboardItem {
    /// Create a new item captured now with a fresh id
    pub fn new(content: impl Into<String>, format: ContentFormat) -> Self {
        Self::with_timestamp(content, format, Utc::now())
    }

    /// Create a new item with an explicit capture instant
    pub fn with_timestamp(
        content: impl Into<String>,
        format: ContentFormat,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            format,
            timestamp,
            metadata: ItemMetadata::default(),
            tags: vec![],
            favorite: false,
            hidden: false,
        }
    }

    /// Two items are duplicates when content and format are identical
    pub fn is_duplicate_of(&self, other: &ClipboardItem) -> bool {
        self.format == other.format && self.content == other.content
    }

    /// Add a tag, keeping insertion order. Returns false for blanks and repeats.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns true if it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag.trim());
        self.tags.len() != before
    }

    /// Check for an exact tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Sensitive or masked items must stay out of indexes and exports
    pub fn is_masked(&self) -> bool {
        self.metadata.sensitive || self.metadata.masked
    }

    /// Age in fractional days relative to `now`
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_milliseconds() as f64 / 86_400_000.0
    }

    /// Character-safe preview for logs and notifications
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.content, max_chars)
    }
}

/// Truncate to `max_chars` characters, appending an ellipsis when cut
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

// ============================================================================
// STORE RESULTS
// ============================================================================

/// Result of saving an item to the history store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum SaveOutcome {
    /// Item written; `evicted` lists ids removed to respect the capacity bound
    Saved { id: String, evicted: Vec<String> },
    /// An item with the same content and format already exists
    Duplicate { existing_id: String },
}

impl SaveOutcome {
    /// Whether the item was actually written
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Pagination request over the newest-first ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum items to return
    pub limit: usize,
    /// Items to skip from the newest
    pub offset: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}

/// A page of items plus the total count of the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<ClipboardItem>,
    pub total: usize,
}

/// Statistics about the history store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Total number of items
    pub total_items: usize,
    /// Items per format
    pub by_format: BTreeMap<String, usize>,
    /// Items flagged sensitive
    pub sensitive_items: usize,
    /// Items flagged favorite
    pub favorite_items: usize,
    /// Timestamp of the oldest item
    pub oldest_item: Option<DateTime<Utc>>,
    /// Timestamp of the newest item
    pub newest_item: Option<DateTime<Utc>>,
    /// Configured capacity
    pub max_size: usize,
}

// ============================================================================
// TESTS
// ============================================================================
