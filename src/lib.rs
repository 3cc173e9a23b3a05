//! Embeddable directory monitoring with dual event delivery.
//!
//! # Architecture
//!
//! ```text
//! Monitor
//!   - owns a NotificationSource (notify::RecommendedWatcher in production)
//!   - normalizes raw notifications into MonitorEvents
//!   - fans each event out on the delivery thread
//!         |
//!    +---------------+---------------+
//!    |                               |
//! callback (synchronous push)   pending queue (consumer pull)
//! ```
//!
//! ```no_run
//! use pathwatch::{EventKind, Monitor};
//!
//! let mut monitor = Monitor::builder("/tmp/watched")
//!     .queue_events(true)
//!     .build()?;
//! monitor.set_callback(|event| {
//!     if event.kind == EventKind::Error {
//!         eprintln!("watch degraded under {}", event.path.display());
//!     }
//! });
//! monitor.start()?;
//!
//! // Elsewhere, e.g. the application's main loop:
//! while let Some(event) = monitor.dequeue() {
//!     println!("{} {}", event.kind, event.path.display());
//! }
//! # Ok::<(), pathwatch::MonitorError>(())
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod monitor;
pub mod source;

pub use config::{LoggingConfig, Settings, WatchConfig};
pub use error::MonitorError;
pub use event::{EventKind, MonitorEvent};
pub use monitor::{EventCallback, Monitor, MonitorBuilder};
pub use source::{EventSink, NameFilter, NotificationSource, NotifySource, RawNotification};
