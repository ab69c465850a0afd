//! Memory Bank
//!
//! In-process similarity graph over learned clipboard content. Each new
//! record is linked to similar records from a bounded recent window, so
//! learning cost does not grow with history size.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{MemoryRecord, Prediction, Suggestion, SuggestionKind};
use super::similarity::{jaccard, token_set};
use crate::content::{ContentClassifier, detect_type};
use crate::item::{CaptureContext, ClipboardItem, ContentFormat, local_hour};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Memory bank tuning constants
#[derive(Debug, Clone)]
pub struct MemoryBankConfig {
    /// Recent records compared against each new record
    pub relationship_window: usize,
    /// Similarity must exceed this to create an edge or a suggestion
    pub similarity_threshold: f64,
    /// Recent records considered by time-of-day prediction
    pub prediction_window: usize,
    /// Maximum time-of-day predictions
    pub max_predictions: usize,
    /// Confidence of time-of-day predictions
    pub prediction_confidence: f64,
    /// Maximum smart suggestions
    pub max_suggestions: usize,
    /// Confidence of smart suggestions
    pub suggestion_confidence: f64,
    /// Total records kept (oldest removed first)
    pub max_records: usize,
    /// Base importance of every record
    pub base_importance: f64,
    /// Content longer than this many characters gains `long_bonus`
    pub long_content_chars: usize,
    pub long_bonus: f64,
    pub code_bonus: f64,
}

impl Default for MemoryBankConfig {
    fn default() -> Self {
        Self {
            relationship_window: 20,
            similarity_threshold: 0.3,
            prediction_window: 10,
            max_predictions: 5,
            prediction_confidence: 0.7,
            max_suggestions: 3,
            suggestion_confidence: 0.8,
            max_records: 1000,
            base_importance: 0.5,
            long_content_chars: 50,
            long_bonus: 0.2,
            code_bonus: 0.3,
        }
    }
}

// ============================================================================
// INSIGHTS
// ============================================================================

/// Aggregate view of what the bank has learned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInsights {
    pub total_records: usize,
    pub average_importance: f64,
    /// Records per content type
    pub by_type: BTreeMap<String, usize>,
    /// Most frequent known applications, most frequent first
    pub top_applications: Vec<(String, usize)>,
    /// Local hour with the most captures
    pub busiest_hour: Option<u32>,
    /// Edges across all records
    pub total_relationships: usize,
    /// Id of the most accessed record
    pub most_accessed: Option<String>,
}

// ============================================================================
// MEMORY BANK
// ============================================================================

/// Similarity-weighted memory of clipboard content
pub struct MemoryBank {
    config: MemoryBankConfig,
    classifier: ContentClassifier,
    /// Oldest first
    records: Mutex<Vec<MemoryRecord>>,
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::with_config(MemoryBankConfig::default())
    }

    pub fn with_config(config: MemoryBankConfig) -> Self {
        Self {
            config,
            classifier: ContentClassifier::new(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &MemoryBankConfig {
        &self.config
    }

    fn records(&self) -> MutexGuard<'_, Vec<MemoryRecord>> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Importance from length and code-ness
    pub fn importance(&self, content: &str, kind: ContentFormat) -> f64 {
        let mut score = self.config.base_importance;
        if content.chars().count() > self.config.long_content_chars {
            score += self.config.long_bonus;
        }
        if kind == ContentFormat::Code {
            score += self.config.code_bonus;
        }
        score.min(1.0)
    }

    /// Learn free-standing content under a fresh `mem_` id
    pub fn learn(&self, content: &str, context: &CaptureContext) -> Option<MemoryRecord> {
        let kind = detect_type(content);
        self.learn_with_id(MemoryRecord::generate_id(), content, kind, context)
    }

    /// Learn a stored item under its own id. Masked items are not learned.
    pub fn learn_item(&self, item: &ClipboardItem, context: &CaptureContext) -> Option<MemoryRecord> {
        if item.is_masked() {
            tracing::debug!(id = %item.id, "Skipping masked item for memory bank");
            return None;
        }
        self.learn_with_id(item.id.clone(), &item.content, item.format, context)
    }

    fn learn_with_id(
        &self,
        id: String,
        content: &str,
        kind: ContentFormat,
        context: &CaptureContext,
    ) -> Option<MemoryRecord> {
        if content.trim().is_empty() {
            tracing::debug!("Ignoring empty content for memory bank");
            return None;
        }

        let formatted = self.classifier.format(content, kind);
        if formatted.metadata.sensitive {
            tracing::debug!("Skipping sensitive content for memory bank");
            return None;
        }

        let tokens = token_set(content);
        let mut records = self.records();
        records.retain(|r| r.id != id);

        let relationships: Vec<String> = records
            .iter()
            .rev()
            .take(self.config.relationship_window)
            .filter(|r| jaccard(&tokens, &token_set(&r.content)) > self.config.similarity_threshold)
            .map(|r| r.id.clone())
            .collect();

        let record = MemoryRecord {
            id,
            content: content.to_string(),
            kind,
            tags: formatted.metadata.derived_tags,
            context: context.clone(),
            importance: self.importance(content, kind),
            relationships,
            accessed_count: 0,
            created_at: context.captured_at,
        };

        records.push(record.clone());
        if records.len() > self.config.max_records {
            let excess = records.len() - self.config.max_records;
            records.drain(..excess);
        }

        tracing::debug!(
            id = %record.id,
            importance = record.importance,
            relationships = record.relationships.len(),
            "Learned clipboard content"
        );
        Some(record)
    }

    /// Recent records captured in the current local hour
    pub fn predict_next_content(&self, now: DateTime<Utc>) -> Vec<Prediction> {
        let hour = local_hour(now);
        self.records()
            .iter()
            .rev()
            .take(self.config.prediction_window)
            .filter(|r| r.context.hour_of_day == hour)
            .take(self.config.max_predictions)
            .map(|r| {
                Prediction::new(
                    r.content.clone(),
                    self.config.prediction_confidence,
                    format!("Similar time pattern ({}:00)", hour),
                )
            })
            .collect()
    }

    /// Other learned content similar to the input, newest first
    pub fn get_smart_suggestions(&self, input: &str) -> Vec<Suggestion> {
        let tokens = token_set(input);
        if tokens.is_empty() {
            return vec![];
        }

        let records = self.records();
        let mut seen: HashSet<&str> = HashSet::new();
        records
            .iter()
            .rev()
            .filter(|r| r.content != input)
            .filter(|r| jaccard(&tokens, &token_set(&r.content)) > self.config.similarity_threshold)
            .filter(|r| seen.insert(r.content.as_str()))
            .take(self.config.max_suggestions)
            .map(|r| Suggestion {
                text: r.content.clone(),
                kind: SuggestionKind::Similar,
                confidence: self.config.suggestion_confidence,
            })
            .collect()
    }

    /// Records captured in a given local hour, newest first
    pub fn records_in_hour(&self, hour: u32, limit: usize) -> Vec<MemoryRecord> {
        self.records()
            .iter()
            .rev()
            .filter(|r| r.context.hour_of_day == hour)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Records linked to `id` in either direction
    pub fn related(&self, id: &str) -> Vec<MemoryRecord> {
        let records = self.records();
        let Some(record) = records.iter().find(|r| r.id == id) else {
            return vec![];
        };
        records
            .iter()
            .filter(|r| r.id != id && (record.is_related_to(&r.id) || r.is_related_to(id)))
            .cloned()
            .collect()
    }

    /// Count an access; returns false for unknown ids
    pub fn record_access(&self, id: &str) -> bool {
        match self.records().iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.accessed_count += 1;
                true
            }
            None => false,
        }
    }

    /// Drop a record and every edge pointing at it
    pub fn forget(&self, id: &str) -> bool {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| r.id != id);
        for record in records.iter_mut() {
            record.relationships.retain(|r| r != id);
        }
        records.len() != before
    }

    /// Relearn from stored items (oldest first), replacing current records
    pub fn rebuild_from(&self, items: &[ClipboardItem]) -> usize {
        self.records().clear();

        let mut ordered: Vec<&ClipboardItem> = items.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let learned = ordered
            .into_iter()
            .filter_map(|item| {
                let context = CaptureContext::at(
                    item.timestamp,
                    Some(item.metadata.application.as_str()),
                    Some(item.metadata.window_title.as_str()),
                );
                self.learn_item(item, &context)
            })
            .count();

        tracing::info!(learned, "Memory bank rebuilt");
        learned
    }

    pub fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.records().iter().find(|r| r.id == id).cloned()
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Vec<MemoryRecord> {
        self.records().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn clear(&self) {
        self.records().clear();
    }

    /// Aggregate statistics
    pub fn get_memory_insights(&self) -> MemoryInsights {
        let records = self.records();
        if records.is_empty() {
            return MemoryInsights::default();
        }

        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut apps: HashMap<&str, usize> = HashMap::new();
        let mut hours = [0usize; 24];
        let mut total_importance = 0.0;
        let mut total_relationships = 0;

        for record in records.iter() {
            *by_type.entry(record.kind.as_str().to_string()).or_insert(0) += 1;
            if record.context.has_application() {
                *apps.entry(record.context.application.as_str()).or_insert(0) += 1;
            }
            hours[(record.context.hour_of_day % 24) as usize] += 1;
            total_importance += record.importance;
            total_relationships += record.relationships.len();
        }

        let mut top_applications: Vec<(String, usize)> =
            apps.into_iter().map(|(a, n)| (a.to_string(), n)).collect();
        top_applications.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_applications.truncate(5);

        // First hour wins ties
        let busiest_hour = hours
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .fold(None::<(usize, usize)>, |best, (h, &n)| match best {
                Some((_, bn)) if bn >= n => best,
                _ => Some((h, n)),
            })
            .map(|(h, _)| h as u32);

        let most_accessed = records
            .iter()
            .filter(|r| r.accessed_count > 0)
            .max_by_key(|r| r.accessed_count)
            .map(|r| r.id.clone());

        MemoryInsights {
            total_records: records.len(),
            average_importance: total_importance / records.len() as f64,
            by_type,
            top_applications,
            busiest_hour,
            total_relationships,
            most_accessed,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
