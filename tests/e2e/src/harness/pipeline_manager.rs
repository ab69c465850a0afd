//! Test Pipeline Manager
//!
//! Provides isolated pipeline instances for testing:
//! - SQLite history in a temporary directory, cleaned up on drop
//! - A scripted clipboard source the test pushes values into
//! - Reopening over the same database to check persistence

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clipmem_core::watcher::ClipboardSnapshot;
use clipmem_core::{
    CaptureContext, CaptureOutcome, ClipboardItem, ClipboardPipeline, ScriptedSource, Settings,
};
use tempfile::TempDir;

/// Pipeline over a throwaway data directory
///
/// # Example
///
/// ```rust,ignore
/// let test = TestPipeline::new();
/// test.copy("hello world");
/// assert_eq!(test.pipeline.store().len(), 1);
/// ```
pub struct TestPipeline {
    pub pipeline: Arc<ClipboardPipeline>,
    pub source: Arc<ScriptedSource>,
    settings: Settings,
    /// Kept alive so the directory outlives the pipeline
    _temp_dir: TempDir,
}

impl TestPipeline {
    /// Fresh pipeline with default settings
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Fresh pipeline; `data_dir` is always replaced by a temp dir
    pub fn with_settings(mut settings: Settings) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        settings.data_dir = Some(temp_dir.path().to_path_buf());
        let source = Arc::new(ScriptedSource::new());
        let pipeline = ClipboardPipeline::open(source.clone(), &settings)
            .expect("Failed to open test pipeline");

        Self {
            pipeline: Arc::new(pipeline),
            source,
            settings,
            _temp_dir: temp_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.settings.db_path().expect("data dir is set")
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Drop the current pipeline and open a new one on the same database
    pub fn reopen(&mut self) {
        self.pipeline.stop();
        let source = Arc::new(ScriptedSource::new());
        let pipeline = ClipboardPipeline::open(source.clone(), &self.settings)
            .expect("Failed to reopen test pipeline");
        self.pipeline = Arc::new(pipeline);
        self.source = source;
    }

    /// Queue a clipboard value and poll once, as the watcher loop would
    pub fn copy_via_watcher(&self, content: &str, application: Option<&str>) -> Option<CaptureOutcome> {
        let mut snapshot = ClipboardSnapshot::new(content);
        if let Some(app) = application {
            snapshot = snapshot.with_application(app);
        }
        self.source.push(snapshot);
        self.pipeline.poll_once().expect("Capture failed")
    }

    /// Push content straight through the pipeline, captured now
    pub fn copy(&self, content: &str) -> CaptureOutcome {
        self.copy_in(content, None)
    }

    /// Push content captured in an application
    pub fn copy_in(&self, content: &str, application: Option<&str>) -> CaptureOutcome {
        let context = CaptureContext::now(application, None);
        self.pipeline
            .process(content, &context)
            .expect("Capture failed")
    }

    /// Push content captured at a specific instant
    pub fn copy_at(&self, content: &str, at: DateTime<Utc>) -> CaptureOutcome {
        let context = CaptureContext::at(at, None, None);
        self.pipeline
            .process(content, &context)
            .expect("Capture failed")
    }

    /// Push content and return the stored item, panicking otherwise
    pub fn capture(&self, content: &str) -> ClipboardItem {
        match self.copy(content) {
            CaptureOutcome::Captured(item) => item,
            other => panic!("expected {:?} to be captured, got {:?}", content, other),
        }
    }
}

impl Default for TestPipeline {
    fn default() -> Self {
        Self::new()
    }
}
