//! Unified logging for diagnostic output.
//!
//! Provides compact timestamped logging with per-module level
//! configuration. Supports `RUST_LOG` for runtime overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"    # quiet by default
//!
//! [logging.modules]
//! monitor = "debug"   # per-event diagnostics
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug my-app
//! RUST_LOG=monitor=debug,source=trace my-app
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initialize logging with configuration.
///
/// Call once at startup; later calls are no-ops. The `RUST_LOG`
/// environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            let mut filter_str = config.default.clone();
            for (module, level) in &config.modules {
                filter_str.push_str(&format!(",{module}={level}"));
            }
            EnvFilter::new(&filter_str)
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize logging with defaults (`warn`, quiet operation).
///
/// Use `RUST_LOG=debug` for verbose output.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event with scope context.
///
/// # Examples
/// ```ignore
/// log_event!("monitor", "started", "{}", root.display());
/// log_event!("monitor", "stopped");
/// ```
#[macro_export]
macro_rules! log_event {
    ($scope:expr, $event:expr) => {
        tracing::info!("[{}] {}", $scope, $event)
    };
    ($scope:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $scope, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("monitor", "event", "{} {}", kind, path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($scope:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $scope, $event)
    };
    ($scope:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $scope, $event, format!($($arg)*))
    };
}
