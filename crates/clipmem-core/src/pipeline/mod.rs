//! Clipboard Pipeline
//!
//! Top-level application context. Owns every component and drives
//! capture → normalize → classify → store → index → learn for each change
//! the watcher reports:
//!
//! ```text
//! Idle → Polling → ChangeDetected → Normalizing → Classifying → Storing
//!      → IndexUpdating → MemoryLearning → Idle
//! ```
//!
//! A duplicate goes straight back to Idle. A failed store write logs, emits
//! `CaptureFailed` and returns to Idle with nothing indexed or learned.
//!
//! Background work runs on tokio tasks: one consumes watcher changes from an
//! mpsc channel, one runs periodic maintenance. Maintenance is single-flight.

mod events;

pub use events::PipelineEvent;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{Settings, SettingsError};
use crate::content::{ContentClassifier, canonicalize};
use crate::item::{CaptureContext, ClipboardItem, Page, PageRequest, SaveOutcome};
use crate::memory::{MemoryBank, MemoryInsights, Prediction, Suggestion};
use crate::prediction::PredictiveEngine;
use crate::search::{SearchFilters, SearchIndex, SearchResult};
use crate::storage::{HistoryStore, ImportReport, SqliteBackend, StorageError};
use crate::watcher::{ClipboardChange, ClipboardSource, ClipboardWatcher};

/// Suggestions attached to an `ItemCaptured` event
pub const CAPTURE_SUGGESTIONS: usize = 3;

/// Event channel capacity; slow subscribers lag rather than block capture
const EVENT_CAPACITY: usize = 256;

/// Pipeline error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Pipeline result type
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Where the pipeline currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    #[default]
    Idle,
    Polling,
    ChangeDetected,
    Normalizing,
    Classifying,
    Storing,
    IndexUpdating,
    MemoryLearning,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Polling => "polling",
            PipelineStage::ChangeDetected => "change-detected",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Storing => "storing",
            PipelineStage::IndexUpdating => "index-updating",
            PipelineStage::MemoryLearning => "memory-learning",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of pushing one raw payload through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Stored, indexed and learned
    Captured(ClipboardItem),
    /// Same (content, format) already stored
    Duplicate { existing_id: String },
    /// Nothing left after normalization
    Ignored,
    /// Stored into a full history but older than everything in it, so the
    /// same save evicted it again
    Evicted { id: String },
}

/// Summary of one maintenance pass
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    /// Ids removed by age-based auto-delete
    pub expired: Vec<String>,
    pub indexed_items: usize,
    pub memory_records: usize,
    pub duration_ms: u64,
}

/// Clears the single-flight flag when a maintenance pass ends, even on error
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

type CaptureSender = Arc<Mutex<Option<mpsc::UnboundedSender<ClipboardChange>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// Clipboard memory application context
pub struct ClipboardPipeline {
    watcher: Arc<ClipboardWatcher>,
    store: Arc<HistoryStore>,
    index: Arc<SearchIndex>,
    bank: Arc<MemoryBank>,
    engine: PredictiveEngine,
    classifier: ContentClassifier,
    events: broadcast::Sender<PipelineEvent>,
    stage: Mutex<PipelineStage>,
    last_capture: Mutex<Option<(String, CaptureContext)>>,
    capture_tx: CaptureSender,
    running: AtomicBool,
    maintenance_running: AtomicBool,
    maintenance_interval: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ClipboardPipeline {
    /// Assemble a pipeline over an opened store; index and memory bank are
    /// rebuilt from the stored history
    pub fn new(source: Arc<dyn ClipboardSource>, store: HistoryStore, settings: &Settings) -> Self {
        let watcher = Arc::new(ClipboardWatcher::with_interval(source, settings.poll_interval()));
        let store = Arc::new(store);
        let index = Arc::new(SearchIndex::new());
        let bank = Arc::new(MemoryBank::new());
        let engine = PredictiveEngine::new(Arc::clone(&bank));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let items = store.get_all();
        index.build(&items);
        bank.rebuild_from(&items);

        let capture_tx: CaptureSender = Arc::new(Mutex::new(None));
        let handler_tx = Arc::clone(&capture_tx);
        watcher.on_change(move |change| {
            if let Some(tx) = lock(&handler_tx).as_ref() {
                if tx.send(change.clone()).is_err() {
                    tracing::debug!("Capture channel closed, dropping change");
                }
            }
        });

        tracing::info!(
            items = items.len(),
            generators = ?engine.generator_names(),
            "Clipboard pipeline assembled"
        );

        Self {
            watcher,
            store,
            index,
            bank,
            engine,
            classifier: ContentClassifier::new(),
            events,
            stage: Mutex::new(PipelineStage::Idle),
            last_capture: Mutex::new(None),
            capture_tx,
            running: AtomicBool::new(false),
            maintenance_running: AtomicBool::new(false),
            maintenance_interval: settings.maintenance_interval(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Pipeline persisting to SQLite at the settings' database path
    pub fn open(source: Arc<dyn ClipboardSource>, settings: &Settings) -> Result<Self> {
        let backend = SqliteBackend::new(Some(settings.db_path()?))?;
        let store = HistoryStore::open(Arc::new(backend), settings.history_config())?;
        Ok(Self::new(source, store, settings))
    }

    /// Ephemeral pipeline with nothing on disk
    pub fn in_memory(source: Arc<dyn ClipboardSource>, settings: &Settings) -> Self {
        Self::new(source, HistoryStore::in_memory(settings.history_config()), settings)
    }

    // ========================================================================
    // COMPONENTS
    // ========================================================================

    pub fn watcher(&self) -> &Arc<ClipboardWatcher> {
        &self.watcher
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    pub fn bank(&self) -> &Arc<MemoryBank> {
        &self.bank
    }

    pub fn engine(&self) -> &PredictiveEngine {
        &self.engine
    }

    /// New receiver for pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn stage(&self) -> PipelineStage {
        *lock(&self.stage)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_stage(&self, stage: PipelineStage) {
        *lock(&self.stage) = stage;
        tracing::debug!(stage = %stage, "Pipeline stage");
    }

    fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start the watcher, the capture consumer and periodic maintenance on
    /// the current tokio runtime. Returns false if already running or no
    /// runtime is available.
    pub fn start(self: &Arc<Self>) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Clipboard pipeline needs a tokio runtime to start");
            return false;
        };
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<ClipboardChange>();
        *lock(&self.capture_tx) = Some(tx);

        let weak: Weak<Self> = Arc::downgrade(self);
        let capture = handle.spawn(async move {
            while let Some(change) = rx.recv().await {
                let Some(pipeline) = weak.upgrade() else { break };
                // Failures are logged and published inside process
                let _ = pipeline.process(&change.raw, &change.context);
            }
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.maintenance_interval;
        let maintenance = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; the store was just bounded on open
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(pipeline) = weak.upgrade() else { break };
                if let Err(e) = pipeline.run_maintenance() {
                    tracing::warn!("Periodic maintenance failed: {}", e);
                }
            }
        });

        lock(&self.tasks).extend([capture, maintenance]);
        self.watcher.start();

        tracing::info!(
            maintenance_secs = period.as_secs(),
            "Clipboard pipeline started"
        );
        true
    }

    /// Stop polling and background tasks. Changes already queued are dropped.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.watcher.stop();
        *lock(&self.capture_tx) = None;
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
        self.set_stage(PipelineStage::Idle);
        tracing::info!("Clipboard pipeline stopped");
    }

    // ========================================================================
    // CAPTURE
    // ========================================================================

    /// Poll the watcher once and process any change synchronously.
    ///
    /// While the pipeline is running the background consumer owns changes,
    /// so this only advances the watcher and returns `None`.
    pub fn poll_once(&self) -> Result<Option<CaptureOutcome>> {
        if self.is_running() {
            self.watcher.poll_change();
            return Ok(None);
        }
        self.set_stage(PipelineStage::Polling);
        let Some(change) = self.watcher.poll_change() else {
            self.set_stage(PipelineStage::Idle);
            return Ok(None);
        };
        self.process(&change.raw, &change.context).map(Some)
    }

    /// Push one raw payload through every stage
    pub fn process(&self, raw: &str, context: &CaptureContext) -> Result<CaptureOutcome> {
        let outcome = self.run_stages(raw, context);
        if let Err(e) = &outcome {
            let stage = self.stage();
            tracing::warn!(stage = %stage, "Capture failed: {}", e);
            self.publish(PipelineEvent::CaptureFailed {
                stage: stage.as_str().to_string(),
                error: e.to_string(),
                timestamp: Utc::now(),
            });
        }
        self.set_stage(PipelineStage::Idle);
        outcome
    }

    fn run_stages(&self, raw: &str, context: &CaptureContext) -> Result<CaptureOutcome> {
        self.set_stage(PipelineStage::ChangeDetected);
        if raw.trim().is_empty() {
            return Ok(CaptureOutcome::Ignored);
        }

        self.set_stage(PipelineStage::Normalizing);
        let (canonical, format) = canonicalize(raw, None);
        if canonical.is_empty() {
            return Ok(CaptureOutcome::Ignored);
        }

        self.set_stage(PipelineStage::Classifying);
        let formatted = self
            .classifier
            .format_with_context(&canonical, format, Some(context));

        self.set_stage(PipelineStage::Storing);
        let mut item =
            ClipboardItem::with_timestamp(formatted.content, formatted.format, context.captured_at);
        item.tags = formatted.metadata.derived_tags.clone();
        item.metadata = formatted.metadata;

        let evicted = match self.store.save(item.clone())? {
            SaveOutcome::Duplicate { existing_id } => {
                tracing::debug!(existing_id = %existing_id, "Duplicate capture skipped");
                self.publish(PipelineEvent::DuplicateSkipped {
                    existing_id: existing_id.clone(),
                    timestamp: Utc::now(),
                });
                return Ok(CaptureOutcome::Duplicate { existing_id });
            }
            SaveOutcome::Saved { evicted, .. } => evicted,
        };
        let evicted_on_arrival = evicted.contains(&item.id);
        let evicted: Vec<String> = evicted.into_iter().filter(|id| *id != item.id).collect();

        if evicted_on_arrival {
            tracing::debug!(id = %item.id, "Capture older than a full history, evicted on arrival");
            for id in &evicted {
                self.index.remove(id);
                self.bank.forget(id);
            }
            if !evicted.is_empty() {
                self.publish(PipelineEvent::ItemsEvicted {
                    ids: evicted,
                    timestamp: Utc::now(),
                });
            }
            return Ok(CaptureOutcome::Evicted { id: item.id });
        }

        self.set_stage(PipelineStage::IndexUpdating);
        for id in &evicted {
            self.index.remove(id);
        }
        self.index.add(&item);

        self.set_stage(PipelineStage::MemoryLearning);
        for id in &evicted {
            self.bank.forget(id);
        }
        if self.bank.learn_item(&item, context).is_none() {
            tracing::debug!(id = %item.id, "Item not learned");
        }

        *lock(&self.last_capture) = Some((item.content.clone(), context.clone()));

        let (original, suggestions) = if item.is_masked() {
            (self.classifier.mask(&item.content), Vec::new())
        } else {
            let mut suggestions = self.bank.get_smart_suggestions(&item.content);
            suggestions.truncate(CAPTURE_SUGGESTIONS);
            (item.content.clone(), suggestions)
        };

        if !evicted.is_empty() {
            self.publish(PipelineEvent::ItemsEvicted {
                ids: evicted,
                timestamp: Utc::now(),
            });
        }

        tracing::info!(
            id = %item.id,
            format = %item.format,
            chars = item.metadata.char_count,
            sensitive = item.metadata.sensitive,
            app = %context.application,
            "Captured clipboard item"
        );
        self.publish(PipelineEvent::ItemCaptured {
            item_id: item.id.clone(),
            original,
            format: item.format.as_str().to_string(),
            tags: item.tags.clone(),
            suggestions,
            timestamp: item.timestamp,
        });

        Ok(CaptureOutcome::Captured(item))
    }

    // ========================================================================
    // UI SURFACE
    // ========================================================================

    /// Similar past content for arbitrary input
    pub fn get_suggestions(&self, input: &str) -> Vec<Suggestion> {
        self.bank.get_smart_suggestions(input)
    }

    /// Predictions for the most recent capture, in the current hour
    pub fn get_predictions(&self) -> Vec<Prediction> {
        let last = lock(&self.last_capture).clone();
        let (content, context) = match last {
            Some((content, ctx)) => {
                let app = ctx.has_application().then_some(ctx.application.as_str());
                let context = CaptureContext::now(app, None);
                (content, context)
            }
            None => (String::new(), CaptureContext::now(None, None)),
        };
        self.engine.predict(&content, &context)
    }

    /// Predictions for explicit content and context
    pub fn predict(&self, content: &str, context: &CaptureContext) -> Vec<Prediction> {
        self.engine.predict(content, context)
    }

    pub fn get_memory_insights(&self) -> MemoryInsights {
        self.bank.get_memory_insights()
    }

    /// Index keys and saved searches starting with a prefix
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        self.index.suggest(prefix)
    }

    /// Ranked search; touching results bumps their memory access count
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchResult> {
        let results = self.index.search(query, filters);
        for result in &results {
            self.bank.record_access(&result.item.id);
        }
        results
    }

    pub fn history(&self, page: PageRequest) -> Page {
        self.store.get_paginated(page)
    }

    // ========================================================================
    // HISTORY MUTATIONS
    // ========================================================================

    /// Delete an item everywhere; returns whether it existed
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.store.delete(id)?;
        self.index.remove(id);
        self.bank.forget(id);
        if removed {
            self.publish(PipelineEvent::ItemDeleted {
                id: id.to_string(),
                timestamp: Utc::now(),
            });
        }
        Ok(removed)
    }

    /// Drop all history and derived data
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        self.index.build(&[]);
        self.bank.clear();
        self.publish(PipelineEvent::HistoryCleared {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let added = self.store.add_tag(id, tag)?;
        self.reindex(id);
        Ok(added)
    }

    pub fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let removed = self.store.remove_tag(id, tag)?;
        self.reindex(id);
        Ok(removed)
    }

    pub fn toggle_favorite(&self, id: &str) -> Result<bool> {
        Ok(self.store.toggle_favorite(id)?)
    }

    /// Change capacity, dropping evicted items from index and memory
    pub fn set_max_size(&self, max_size: usize) -> Vec<String> {
        let evicted = self.store.set_max_size(max_size);
        for id in &evicted {
            self.index.remove(id);
            self.bank.forget(id);
        }
        evicted
    }

    fn reindex(&self, id: &str) {
        if let Some(item) = self.store.get(id) {
            self.index.add(&item);
        }
    }

    pub fn export_json(&self, path: &Path, include_sensitive: bool) -> Result<usize> {
        Ok(self.store.export_json(path, include_sensitive)?)
    }

    /// Import an export file, then rebuild index and memory from the store
    pub fn import_json(&self, path: &Path) -> Result<ImportReport> {
        let report = self.store.import_json(path)?;
        let items = self.store.get_all();
        self.index.build(&items);
        self.bank.rebuild_from(&items);
        Ok(report)
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Age-based auto-delete plus an index rebuild.
    ///
    /// Returns `None` when another pass is already in flight.
    pub fn run_maintenance(&self) -> Result<Option<MaintenanceReport>> {
        if self
            .maintenance_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Maintenance already running, skipping");
            return Ok(None);
        }
        let _guard = FlightGuard(&self.maintenance_running);
        let started = Instant::now();

        let expired = self.store.run_maintenance(Utc::now())?;
        for id in &expired {
            self.bank.forget(id);
        }
        let items = self.store.get_all();
        self.index.build(&items);

        let report = MaintenanceReport {
            expired,
            indexed_items: self.index.stats().items,
            memory_records: self.bank.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            expired = report.expired.len(),
            indexed_items = report.indexed_items,
            memory_records = report.memory_records,
            duration_ms = report.duration_ms,
            "Maintenance complete"
        );
        self.publish(PipelineEvent::MaintenanceCompleted {
            expired: report.expired.len(),
            indexed_items: report.indexed_items,
            memory_records: report.memory_records,
            duration_ms: report.duration_ms,
            timestamp: Utc::now(),
        });

        Ok(Some(report))
    }
}

impl Drop for ClipboardPipeline {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}
