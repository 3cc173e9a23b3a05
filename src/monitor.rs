//! The monitor: normalization and dual delivery of file system events.
//!
//! A [`Monitor`] owns one watch target. Raw notifications arrive on the
//! source's delivery thread, are normalized into [`MonitorEvent`]s, and fan
//! out to the registered callback (synchronously, on the notifying thread)
//! and, when queueing is enabled, to a FIFO queue drained by the consumer
//! at its own pace.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::error::MonitorError;
use crate::event::{EventKind, MonitorEvent};
use crate::source::{EventSink, NameFilter, NotificationSource, NotifySource, RawNotification};

/// Callback invoked synchronously for every normalized event.
///
/// Runs on the notification source's delivery thread, so it should return
/// promptly. Context the original C-style `(sender, event)` pair would
/// carry is captured by the closure instead.
pub type EventCallback = Arc<dyn Fn(&MonitorEvent) + Send + Sync>;

/// Watches a single root path and fans observed changes out to a
/// synchronous callback and an optional pull queue.
///
/// Lifecycle: `Created --start--> Active --stop--> Inactive --start-->
/// Active`, and any state `--close--> Disposed` (terminal). `start` after
/// `close` fails with [`MonitorError::Disposed`]; `stop` and `close` are
/// idempotent.
pub struct Monitor {
    shared: Arc<Shared>,
    source: Box<dyn NotificationSource>,
    active: bool,
    disposed: bool,
}

/// State shared with the dispatch sink running on the delivery thread.
struct Shared {
    root: PathBuf,
    queue_events: bool,
    callback: Mutex<Option<EventCallback>>,
    pending: Mutex<VecDeque<MonitorEvent>>,
}

impl Shared {
    fn dispatch(&self, raw: RawNotification) {
        let event = self.normalize(raw);
        crate::debug_event!("monitor", "event", "{} {}", event.kind, event.path.display());

        // Snapshot under the lock, invoke outside it: clearing the callback
        // mid-notification must not block or crash, and the callback itself
        // may call back into the monitor.
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            // A panicking callback must not kill the delivery thread or
            // skip the enqueue below.
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                tracing::error!(
                    "[monitor] event callback panicked on {} {}",
                    event.kind,
                    event.path.display()
                );
            }
        }

        if self.queue_events {
            self.pending.lock().push_back(event);
        }
    }

    fn normalize(&self, raw: RawNotification) -> MonitorEvent {
        match raw {
            RawNotification::Created(path) => MonitorEvent::new(path, EventKind::Create),
            RawNotification::Changed(path) => MonitorEvent::new(path, EventKind::Change),
            RawNotification::Renamed { to, .. } => MonitorEvent::new(to, EventKind::Rename),
            RawNotification::Removed(path) => MonitorEvent::new(path, EventKind::Delete),
            RawNotification::Error(reason) => {
                tracing::warn!("[monitor] watch error: {reason}");
                MonitorEvent::new(self.root.clone(), EventKind::Error)
            }
        }
    }
}

impl Monitor {
    /// Create a builder for configuring a monitor.
    pub fn builder(root: impl Into<PathBuf>) -> MonitorBuilder {
        MonitorBuilder::new(root)
    }

    /// Monitor `root` with defaults: every file name, recursive, queueing
    /// disabled.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let source = NotifySource::new(root.clone(), NameFilter::default(), true);
        Self::assemble(root, false, Box::new(source))
    }

    /// Monitor `root` configured from the `[watch]` section of `settings`.
    pub fn from_settings(
        root: impl Into<PathBuf>,
        settings: &Settings,
    ) -> Result<Self, MonitorError> {
        Self::builder(root)
            .filter(&settings.watch.filter)
            .recursive(settings.watch.recursive)
            .queue_events(settings.watch.queue_events)
            .build()
    }

    fn assemble(root: PathBuf, queue_events: bool, source: Box<dyn NotificationSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                root,
                queue_events,
                callback: Mutex::new(None),
                pending: Mutex::new(VecDeque::new()),
            }),
            source,
            active: false,
            disposed: false,
        }
    }

    /// Root path this monitor watches.
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// True between a successful [`start`](Self::start) and the next
    /// [`stop`](Self::stop) or [`close`](Self::close).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable the underlying watch and begin delivering events.
    ///
    /// Idempotent while active: a second `start` neither re-subscribes nor
    /// double-fires events. On failure the monitor stays inactive and
    /// `start` may be retried.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.disposed {
            return Err(MonitorError::Disposed);
        }
        if self.active {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let sink: EventSink = Arc::new(move |raw| shared.dispatch(raw));
        self.source.enable(sink)?;
        self.active = true;

        crate::log_event!("monitor", "started", "{}", self.shared.root.display());
        Ok(())
    }

    /// Disable the underlying watch.
    ///
    /// No-op when already inactive. Events queued before the stop stay
    /// drainable; a notification already in flight on the delivery thread
    /// may still be dispatched.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.source.disable();
        self.active = false;

        crate::log_event!("monitor", "stopped", "{}", self.shared.root.display());
    }

    /// Register the synchronous event callback, replacing any previous one.
    ///
    /// The callback runs on the delivery thread, before the event is
    /// queued. A panic in the callback is caught and logged; the event is
    /// still queued and later notifications are unaffected.
    pub fn set_callback(&self, callback: impl Fn(&MonitorEvent) + Send + Sync + 'static) {
        *self.shared.callback.lock() = Some(Arc::new(callback));
    }

    /// Remove the event callback.
    ///
    /// A notification already being dispatched may still invoke the
    /// previous callback once.
    pub fn clear_callback(&self) {
        *self.shared.callback.lock() = None;
    }

    /// Whether the pending queue currently holds events.
    ///
    /// Advisory under concurrent delivery: a `false` result means "maybe
    /// empty, check again later". It never reports `true` for a queue that
    /// is empty at the time the lock is taken.
    pub fn has_pending_events(&self) -> bool {
        !self.shared.pending.lock().is_empty()
    }

    /// Pop the oldest pending event, FIFO across all kinds.
    ///
    /// Always `None` when queueing was not enabled at construction.
    pub fn dequeue(&self) -> Option<MonitorEvent> {
        self.shared.pending.lock().pop_front()
    }

    /// Stop watching and release the underlying watch resource.
    ///
    /// Terminal and idempotent; safe without a prior `start`. Afterwards
    /// [`start`](Self::start) fails with [`MonitorError::Disposed`]. The
    /// pending queue stays drainable. Dropping the monitor performs the
    /// same cleanup.
    pub fn close(&mut self) {
        if self.disposed {
            return;
        }
        if self.active {
            self.stop();
        }
        self.source.disable();
        self.disposed = true;

        crate::debug_event!("monitor", "closed", "{}", self.shared.root.display());
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Builder for a [`Monitor`].
pub struct MonitorBuilder {
    root: PathBuf,
    filter: String,
    recursive: bool,
    queue_events: bool,
    source: Option<Box<dyn NotificationSource>>,
}

impl MonitorBuilder {
    fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: "*".to_string(),
            recursive: true,
            queue_events: false,
            source: None,
        }
    }

    /// Glob pattern restricting which file names produce events.
    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = pattern.into();
        self
    }

    /// Whether subdirectories are included in the watch scope.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Buffer events into the pull queue in addition to the callback.
    pub fn queue_events(mut self, queue_events: bool) -> Self {
        self.queue_events = queue_events;
        self
    }

    /// Substitute the notification source. Filter and recursion settings
    /// only apply to the default source.
    pub fn source(mut self, source: Box<dyn NotificationSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the monitor.
    ///
    /// Fails only on an invalid filter pattern; whether the root can
    /// actually be watched is determined at [`Monitor::start`].
    pub fn build(self) -> Result<Monitor, MonitorError> {
        let filter = NameFilter::new(&self.filter)
            .map_err(|e| MonitorError::setup(&self.root, format!("invalid filter pattern: {e}")))?;

        let source = self.source.unwrap_or_else(|| {
            Box::new(NotifySource::new(
                self.root.clone(),
                filter,
                self.recursive,
            ))
        });

        Ok(Monitor::assemble(self.root, self.queue_events, source))
    }
}
