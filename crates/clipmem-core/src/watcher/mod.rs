//! Clipboard Watcher
//!
//! Polls a `ClipboardSource` on a fixed interval and fires handlers once per
//! distinct new value. The watcher neither normalizes nor stores anything.
//!
//! The last-seen value is swapped under a mutex before any handler runs, so
//! two overlapping polls can never both fire for the same content.

mod source;

pub use source::{ClipboardSnapshot, ClipboardSource, Result, ScriptedSource, SourceError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::item::CaptureContext;

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// A distinct new clipboard value
#[derive(Debug, Clone)]
pub struct ClipboardChange {
    /// Payload exactly as read
    pub raw: String,
    pub context: CaptureContext,
}

/// Callback invoked for each change
pub type ChangeHandler = Arc<dyn Fn(&ClipboardChange) + Send + Sync>;

/// Change-detecting poller over a clipboard source
pub struct ClipboardWatcher {
    source: Arc<dyn ClipboardSource>,
    last_seen: Mutex<Option<String>>,
    handlers: Mutex<Vec<ChangeHandler>>,
    poll_interval: Mutex<Duration>,
    monitoring: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl ClipboardWatcher {
    pub fn new(source: Arc<dyn ClipboardSource>) -> Self {
        Self::with_interval(source, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(source: Arc<dyn ClipboardSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            last_seen: Mutex::new(None),
            handlers: Mutex::new(Vec::new()),
            poll_interval: Mutex::new(poll_interval.max(Duration::from_millis(1))),
            monitoring: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Register a change handler
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&ClipboardChange) + Send + Sync + 'static,
    {
        lock(&self.handlers).push(Arc::new(handler));
    }

    pub fn poll_interval(&self) -> Duration {
        *lock(&self.poll_interval)
    }

    /// Change the poll interval. A running loop is restarted to pick it up.
    pub fn set_poll_interval(self: &Arc<Self>, interval: Duration) {
        *lock(&self.poll_interval) = interval.max(Duration::from_millis(1));
        if self.is_monitoring() {
            self.stop();
            self.start();
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Start the poll loop on the current tokio runtime.
    ///
    /// Returns false when already running or when called outside a runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Clipboard watcher needs a tokio runtime to start");
            return false;
        };
        if self.monitoring.swap(true, Ordering::SeqCst) {
            return false;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.poll_interval();
        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                // Watcher dropped: nothing left to drive
                let Some(watcher) = weak.upgrade() else { break };
                // Sources may shell out; keep the read off the async workers
                if let Err(e) = tokio::task::spawn_blocking(move || watcher.poll_once()).await {
                    tracing::warn!("Clipboard poll task failed: {}", e);
                }
            }
        });
        *lock(&self.task) = Some(task);

        tracing::info!(interval_ms = period.as_millis() as u64, "Clipboard watcher started");
        true
    }

    /// Stop the poll loop; a no-op when not running
    pub fn stop(&self) {
        if !self.monitoring.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
        tracing::info!("Clipboard watcher stopped");
    }

    /// Read the source once; returns whether handlers fired.
    ///
    /// Source errors are logged and swallowed so the loop keeps going.
    pub fn poll_once(&self) -> bool {
        self.poll_change().is_some()
    }

    /// Like `poll_once`, but hands back the change that fired
    pub fn poll_change(&self) -> Option<ClipboardChange> {
        match self.source.read() {
            Ok(Some(snapshot)) => self.observe(snapshot),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Clipboard read failed: {}", e);
                None
            }
        }
    }

    /// Inject a value through the same change detection as a poll
    pub fn simulate_change(&self, content: &str) -> bool {
        self.observe(ClipboardSnapshot::new(content)).is_some()
    }

    /// Value the watcher last fired for
    pub fn last_seen(&self) -> Option<String> {
        lock(&self.last_seen).clone()
    }

    fn observe(&self, snapshot: ClipboardSnapshot) -> Option<ClipboardChange> {
        if snapshot.content.trim().is_empty() {
            return None;
        }

        {
            let mut last = lock(&self.last_seen);
            if last.as_deref() == Some(snapshot.content.as_str()) {
                return None;
            }
            *last = Some(snapshot.content.clone());
        }

        let change = ClipboardChange {
            context: CaptureContext::now(
                snapshot.application.as_deref(),
                snapshot.window_title.as_deref(),
            ),
            raw: snapshot.content,
        };
        tracing::debug!(chars = change.raw.chars().count(), app = %change.context.application, "Clipboard change detected");

        // Snapshot the list so handlers may register more handlers
        let handlers: Vec<ChangeHandler> = lock(&self.handlers).clone();
        for handler in handlers {
            handler(&change);
        }
        Some(change)
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(watcher: &ClipboardWatcher) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        watcher.on_change(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_repeated_value_fires_once() {
        let source = Arc::new(ScriptedSource::from_contents(["x", "x", "x", "y"]));
        let watcher = ClipboardWatcher::new(source);
        let count = counting(&watcher);

        let fired: Vec<bool> = (0..4).map(|_| watcher.poll_once()).collect();
        assert_eq!(fired, vec![true, false, false, true]);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(watcher.last_seen().as_deref(), Some("y"));
    }

    #[test]
    fn test_errors_and_blank_reads_are_skipped() {
        let source = Arc::new(ScriptedSource::new());
        source.push_error(SourceError::Command("xclip exited 1".into()));
        source.push_empty();
        source.push(ClipboardSnapshot::new("   \n"));
        source.push(ClipboardSnapshot::new("hello").with_application("terminal"));

        let watcher = ClipboardWatcher::new(source);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        watcher.on_change(move |change| {
            s.lock().unwrap().push((change.raw.clone(), change.context.application.clone()));
        });

        for _ in 0..4 {
            watcher.poll_once();
        }
        assert_eq!(*seen.lock().unwrap(), vec![("hello".to_string(), "terminal".to_string())]);
    }

    #[test]
    fn test_simulate_change_shares_detection() {
        let watcher = ClipboardWatcher::new(Arc::new(ScriptedSource::new()));
        let count = counting(&watcher);
        assert!(watcher.simulate_change("a"));
        assert!(!watcher.simulate_change("a"));
        assert!(watcher.simulate_change("b"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_context_is_unknown() {
        let watcher = ClipboardWatcher::new(Arc::new(ScriptedSource::new()));
        let app = Arc::new(Mutex::new(String::new()));
        let a = Arc::clone(&app);
        watcher.on_change(move |change| *a.lock().unwrap() = change.context.window_title.clone());
        watcher.simulate_change("copied");
        assert_eq!(*app.lock().unwrap(), crate::item::UNKNOWN);
    }

    #[test]
    fn test_start_outside_runtime_is_refused() {
        let watcher = Arc::new(ClipboardWatcher::new(Arc::new(ScriptedSource::new())));
        assert!(!watcher.start());
        assert!(!watcher.is_monitoring());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_runs_until_stopped() {
        let source = Arc::new(ScriptedSource::from_contents(["one", "two", "two"]));
        let watcher = Arc::new(ClipboardWatcher::with_interval(
            Arc::clone(&source) as Arc<dyn ClipboardSource>,
            Duration::from_millis(100),
        ));
        let count = counting(&watcher);

        assert!(watcher.start());
        assert!(!watcher.start());
        assert!(watcher.is_monitoring());

        tokio::time::sleep(Duration::from_millis(450)).await;
        watcher.stop();
        assert!(!watcher.is_monitoring());
        assert_eq!(count.load(Ordering::SeqCst), 2);

        source.push(ClipboardSnapshot::new("three"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(source.remaining(), 1);
    }
}
