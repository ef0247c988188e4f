//! Logging infrastructure - structured tracing throughout the bridge
//!
//! Design: uses `tracing` for structured, contextual logging with:
//! - One target per subsystem (`buffer`, `dispatch`, `registry`, `ffi`, `bridge`)
//! - Zero-cost when disabled
//! - Console or daily-rolling file output, pretty/compact/JSON

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the background file writer alive for the life of the process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Log file name prefix inside `file_directory`
pub const LOG_FILE_PREFIX: &str = "foreign-bridge.log";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    pub format: LogFormat,
    /// Directory for daily-rolling log files; console when `None`
    pub file_directory: Option<String>,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            file_directory: None,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FOREIGN_BRIDGE_LOG_*` variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        // FOREIGN_BRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("FOREIGN_BRIDGE_LOG_LEVEL") {
            self.level = parse_level(&level).unwrap_or(self.level);
        }

        // FOREIGN_BRIDGE_LOG_FILE: directory for rolling log files
        if let Ok(dir) = std::env::var("FOREIGN_BRIDGE_LOG_FILE") {
            self.file_directory = Some(dir);
        }

        if std::env::var("FOREIGN_BRIDGE_LOG_JSON").is_ok() {
            self.format = LogFormat::Json;
        }

        if std::env::var("FOREIGN_BRIDGE_LOG_SPANS").is_ok() {
            self.show_spans = true;
        }

        self
    }

    /// Minimal logging for hot paths
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            format: LogFormat::Compact,
            ..Self::default()
        }
    }

    /// Verbose logging
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            show_spans: true,
            ..Self::default()
        }
    }
}

/// Parse a level name, case-insensitive
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber. If the host already installed
/// one, the bridge logs through it.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let base = fmt::layer()
            .with_writer(make_writer(&config))
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions));

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Pretty => base.boxed(),
        };

        let _ = tracing_subscriber::registry()
            .with(layer)
            .with(env_filter)
            .try_init();
    });
}

fn make_writer(config: &LogConfig) -> BoxMakeWriter {
    match &config.file_directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            BoxMakeWriter::new(writer)
        }
        None => BoxMakeWriter::new(io::stderr),
    }
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Bridge-specific logging functions
// ============================================================================

/// Log bridge initialization
pub fn log_bridge_init() {
    use tracing::info;
    info!(
        target: "bridge",
        event = "bridge_init",
        version = env!("CARGO_PKG_VERSION"),
        "Foreign bridge initializing"
    );
}

/// Log buffer byte access (only when access tracing is on)
#[inline]
pub fn log_buffer_access(op: &str, index: usize, value: u8) {
    use tracing::trace;
    trace!(target: "buffer", event = "access", op, index, value, "Buffer access");
}

/// Log a rejected index
pub fn log_bounds_violation(index: i64, length: usize) {
    use tracing::debug;
    debug!(
        target: "buffer",
        event = "bounds_violation",
        index,
        length,
        "Index out of bounds"
    );
}

/// Log a message sent to a receiver lacking the capability
pub fn log_capability_mismatch(receiver: &str, capability: &str) {
    use tracing::debug;
    debug!(
        target: "buffer",
        event = "capability_mismatch",
        receiver,
        capability,
        "Unsupported message"
    );
}

/// Log managed bytes moving to native memory
pub fn log_materialize(size: usize, address: usize) {
    use tracing::debug;
    debug!(
        target: "buffer",
        event = "materialize",
        size_bytes = size,
        address = %format!("{:#x}", address),
        "Managed bytes moved to native memory"
    );
}

/// Log type conversion
pub fn log_type_conversion(from_type: &str, to_type: &str) {
    use tracing::trace;
    trace!(
        target: "dispatch",
        event = "type_conversion",
        from = from_type,
        to = to_type,
        "Type conversion performed"
    );
}

/// Log an operation dispatched to its entry point
#[inline]
pub fn log_native_call(kind: &str, convention: &str, arg_count: usize) {
    use tracing::trace;
    trace!(
        target: "dispatch",
        event = "native_call",
        kind,
        convention,
        args = arg_count,
        "Operation invoked"
    );
}

/// Log operation return
#[inline]
pub fn log_native_return(kind: &str) {
    use tracing::trace;
    trace!(target: "dispatch", event = "native_return", kind, "Operation returned");
}

/// Log operation failure
pub fn log_native_error(kind: &str, error: &str) {
    use tracing::warn;
    warn!(
        target: "dispatch",
        event = "native_error",
        kind,
        error,
        "Operation failed"
    );
}

/// Log dynamic library load
pub fn log_library_load(name: &str) {
    use tracing::debug;
    debug!(target: "registry", event = "library_load", library = name, "Library loaded");
}

/// Log method registration
pub fn log_registration(kind: &str, convention: &str) {
    use tracing::debug;
    debug!(
        target: "registry",
        event = "register",
        kind,
        convention,
        "Method registered"
    );
}

/// Log a refused re-registration
pub fn log_duplicate_registration(kind: &str, existing: &str, attempted: &str) {
    use tracing::warn;
    warn!(
        target: "registry",
        event = "duplicate_registration",
        kind,
        existing,
        attempted,
        "Method already registered"
    );
}

/// Log class publication
pub fn log_class_published(package: &str, name: &str, method_count: usize) {
    use tracing::info;
    info!(
        target: "registry",
        event = "class_published",
        package,
        class = name,
        methods = method_count,
        "Class published"
    );
}

/// Log FFI error
pub fn log_ffi_error(fn_name: &str, error: &str) {
    use tracing::error;
    error!(
        target: "ffi",
        event = "ffi_error",
        function = fn_name,
        error,
        "FFI function error"
    );
}
