//! Normalized event model.
//!
//! Raw backend notifications are translated into these uniform values
//! before delivery, so callers never see platform-specific event shapes.

use std::fmt;
use std::path::PathBuf;

/// Kind of file system activity observed under a watched root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An entry was created.
    Create,
    /// An entry's contents or metadata changed.
    Change,
    /// An entry was renamed. The event path is the new path when known.
    Rename,
    /// An entry was deleted.
    Delete,
    /// The underlying watch reported an internal error.
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Create => "create",
            EventKind::Change => "change",
            EventKind::Rename => "rename",
            EventKind::Delete => "delete",
            EventKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single normalized file system event.
///
/// Events are pure data: each is built once by the dispatch path and then
/// handed to the callback, pushed onto the pending queue, or both. For
/// [`EventKind::Error`] the path is the monitor's root path, since the
/// backend does not report which path failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    /// Path of the affected entry.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: EventKind,
}

impl MonitorEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_compare_by_value() {
        let a = MonitorEvent::new("/watched/a.txt", EventKind::Create);
        let b = MonitorEvent::new("/watched/a.txt", EventKind::Create);
        let c = MonitorEvent::new("/watched/a.txt", EventKind::Delete);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(EventKind::Create.to_string(), "create");
        assert_eq!(EventKind::Error.to_string(), "error");
    }
}
