//! Clipboard sources
//!
//! The watcher reads the clipboard through `ClipboardSource` so OS specifics
//! stay outside the core. `ScriptedSource` replays a fixed sequence of reads
//! and is what tests and the e2e harness drive.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Clipboard source error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Clipboard could not be read right now
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    /// External clipboard command failed
    #[error("Clipboard command failed: {0}")]
    Command(String),
    /// Read took longer than the configured timeout
    #[error("Clipboard read timed out after {0}ms")]
    Timeout(u64),
}

/// Source result type
pub type Result<T> = std::result::Result<T, SourceError>;

/// One read of the clipboard with whatever context the source could provide
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardSnapshot {
    pub content: String,
    pub application: Option<String>,
    pub window_title: Option<String>,
}

impl ClipboardSnapshot {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_window_title(mut self, window_title: impl Into<String>) -> Self {
        self.window_title = Some(window_title.into());
        self
    }
}

/// Anything the watcher can poll.
///
/// `Ok(None)` means the clipboard holds nothing textual.
pub trait ClipboardSource: Send + Sync {
    fn read(&self) -> Result<Option<ClipboardSnapshot>>;
}

/// Replays queued reads in order, then keeps returning the last one
#[derive(Default)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Result<Option<ClipboardSnapshot>>>>,
    last: Mutex<Option<ClipboardSnapshot>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that yields each content once, in order
    pub fn from_contents<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new();
        for content in contents {
            source.push(ClipboardSnapshot::new(content));
        }
        source
    }

    pub fn push(&self, snapshot: ClipboardSnapshot) {
        self.queue_lock().push_back(Ok(Some(snapshot)));
    }

    pub fn push_error(&self, error: SourceError) {
        self.queue_lock().push_back(Err(error));
    }

    pub fn push_empty(&self) {
        self.queue_lock().push_back(Ok(None));
    }

    /// Reads still queued
    pub fn remaining(&self) -> usize {
        self.queue_lock().len()
    }

    fn queue_lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Option<ClipboardSnapshot>>>> {
        self.queue.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ClipboardSource for ScriptedSource {
    fn read(&self) -> Result<Option<ClipboardSnapshot>> {
        let next = self.queue_lock().pop_front();
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        match next {
            Some(Ok(Some(snapshot))) => {
                *last = Some(snapshot.clone());
                Ok(Some(snapshot))
            }
            Some(other) => other,
            // A real clipboard keeps its value between copies
            None => Ok(last.clone()),
        }
    }
}
