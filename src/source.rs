//! Notification source abstraction and the notify-backed implementation.
//!
//! The monitor core depends only on the [`NotificationSource`] trait, so
//! the backend can be substituted (tests drive a hand-rolled source).
//! [`NotifySource`] is the production implementation wrapping
//! `notify::RecommendedWatcher`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind as NotifyKind, RecursiveMode, Watcher};

use crate::error::MonitorError;

/// A raw notification as delivered by a source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNotification {
    Created(PathBuf),
    Changed(PathBuf),
    /// `from` is absent when the backend only reported the destination.
    Renamed {
        from: Option<PathBuf>,
        to: PathBuf,
    },
    Removed(PathBuf),
    /// The source failed internally (e.g. kernel queue overflow). Carries
    /// no path; the monitor substitutes its root.
    Error(String),
}

impl RawNotification {
    /// Path this notification is about, if it has one.
    fn path(&self) -> Option<&Path> {
        match self {
            RawNotification::Created(p)
            | RawNotification::Changed(p)
            | RawNotification::Removed(p) => Some(p),
            RawNotification::Renamed { to, .. } => Some(to),
            RawNotification::Error(_) => None,
        }
    }
}

/// Sink installed by the monitor. Invoked on the source's delivery thread.
pub type EventSink = Arc<dyn Fn(RawNotification) + Send + Sync>;

/// An enable/disable-able source of raw file system notifications.
///
/// Implementations deliver notifications serially on their own thread(s).
pub trait NotificationSource: Send {
    /// Subscribe `sink` and begin delivering notifications to it.
    ///
    /// Enabling an already enabled source must tear down the previous
    /// subscription first; notifications are never double-delivered.
    fn enable(&mut self, sink: EventSink) -> Result<(), MonitorError>;

    /// Halt delivery and unsubscribe. Idempotent.
    ///
    /// A notification already in flight on the delivery thread may still
    /// reach the sink after this returns.
    fn disable(&mut self);
}

/// Glob-style file name filter.
///
/// Matches against the final path component only, so `*.log` admits
/// `/watched/deep/dir/out.log`. The default filter admits every name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pattern: Option<Pattern>,
}

impl NameFilter {
    /// Parse a glob pattern. `"*"` is recognized as match-all.
    pub fn new(pattern: &str) -> Result<Self, glob::PatternError> {
        if pattern == "*" {
            return Ok(Self::default());
        }
        Ok(Self {
            pattern: Some(Pattern::new(pattern)?),
        })
    }

    /// Whether this notification passes the filter.
    ///
    /// Error notifications always pass: a filter restricts which entries
    /// are reported, not whether the watch itself is healthy.
    pub fn allows(&self, raw: &RawNotification) -> bool {
        match raw.path() {
            Some(path) => self.matches_path(path),
            None => true,
        }
    }

    fn matches_path(&self, path: &Path) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };
        match path.file_name() {
            Some(name) => pattern.matches(&name.to_string_lossy()),
            // No final component (e.g. the root itself): let it through.
            None => true,
        }
    }
}

/// Production source backed by `notify::RecommendedWatcher`.
///
/// Construction performs no validation; a missing root or insufficient
/// permissions surface from [`enable`](NotificationSource::enable).
pub struct NotifySource {
    root: PathBuf,
    filter: NameFilter,
    recursive: bool,
    watcher: Option<notify::RecommendedWatcher>,
}

impl NotifySource {
    pub fn new(root: impl Into<PathBuf>, filter: NameFilter, recursive: bool) -> Self {
        Self {
            root: root.into(),
            filter,
            recursive,
            watcher: None,
        }
    }
}

impl NotificationSource for NotifySource {
    fn enable(&mut self, sink: EventSink) -> Result<(), MonitorError> {
        // Drop any previous watcher before subscribing again so events are
        // never delivered twice.
        self.watcher = None;

        let filter = self.filter.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for raw in map_event(event) {
                        if filter.allows(&raw) {
                            sink(raw);
                        }
                    }
                }
                Err(e) => sink(RawNotification::Error(e.to_string())),
            })
            .map_err(|e| MonitorError::setup(&self.root, e))?;

        let mode = if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&self.root, mode)
            .map_err(|e| MonitorError::setup(&self.root, e))?;

        crate::debug_event!("source", "watching", "{}", self.root.display());
        self.watcher = Some(watcher);
        Ok(())
    }

    fn disable(&mut self) {
        if self.watcher.take().is_some() {
            crate::debug_event!("source", "unwatched", "{}", self.root.display());
        }
    }
}

/// Map a backend event to raw notifications.
///
/// Renames follow the semantics of the normalized model: a rename observed
/// with both endpoints stays a rename, while a move whose other endpoint is
/// outside the watch scope degrades to a removal or creation.
fn map_event(event: Event) -> Vec<RawNotification> {
    match event.kind {
        NotifyKind::Create(_) => event
            .paths
            .into_iter()
            .map(RawNotification::Created)
            .collect(),
        NotifyKind::Modify(ModifyKind::Name(mode)) => map_rename(mode, event.paths),
        NotifyKind::Modify(_) => event
            .paths
            .into_iter()
            .map(RawNotification::Changed)
            .collect(),
        NotifyKind::Remove(_) => event
            .paths
            .into_iter()
            .map(RawNotification::Removed)
            .collect(),
        // Access events and backend-internal kinds carry no change.
        _ => Vec::new(),
    }
}

fn map_rename(mode: RenameMode, mut paths: Vec<PathBuf>) -> Vec<RawNotification> {
    match mode {
        RenameMode::Both if paths.len() >= 2 => {
            let to = paths.remove(1);
            let from = paths.remove(0);
            vec![RawNotification::Renamed {
                from: Some(from),
                to,
            }]
        }
        // Only the old name is in scope: the entry effectively left.
        RenameMode::From => paths.into_iter().map(RawNotification::Removed).collect(),
        // Only the new name is in scope: the entry effectively appeared.
        RenameMode::To => paths.into_iter().map(RawNotification::Created).collect(),
        _ => paths
            .into_iter()
            .map(|p| RawNotification::Renamed { from: None, to: p })
            .collect(),
    }
}
