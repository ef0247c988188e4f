//! Bridge configuration (`foreign-bridge.toml`)
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [registry]
//! enabled_conventions = ["direct-pointer", "managed"]
//!
//! [buffer]
//! trace_access = true
//! ```

use crate::error::{InteropError, Result};
use crate::interop::{CallingConvention, ConventionSet};
use crate::logging::{parse_level, LogConfig, LogFormat};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file looked up by `find_and_load`
pub const CONFIG_FILE_NAME: &str = "foreign-bridge.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub buffer: BufferSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files
    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub spans: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Conventions accepted at registration
    #[serde(default = "default_conventions")]
    pub enabled_conventions: Vec<CallingConvention>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferSection {
    /// Trace every read/write on buffers built from this config
    #[serde(default)]
    pub trace_access: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
            spans: false,
        }
    }
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            enabled_conventions: default_conventions(),
        }
    }
}

impl RegistrySection {
    pub fn enabled(&self) -> ConventionSet {
        self.enabled_conventions.iter().copied().collect()
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_conventions() -> Vec<CallingConvention> {
    CallingConvention::ALL.to_vec()
}

impl BridgeConfig {
    /// Parse configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| InteropError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            InteropError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Find `foreign-bridge.toml` in `dir` or its parents
    ///
    /// Returns the defaults when no file exists; a file that exists but does
    /// not parse is an error.
    pub fn find_and_load(dir: &Path) -> Result<Self> {
        match Self::locate(dir) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn locate(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Defaults with `FOREIGN_BRIDGE_*` overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides
    ///
    /// Logging variables as in `LogConfig::from_env`, plus
    /// `FOREIGN_BRIDGE_CONVENTIONS` (comma-separated tag names) and
    /// `FOREIGN_BRIDGE_TRACE_ACCESS`. Unrecognized values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("FOREIGN_BRIDGE_LOG_LEVEL") {
            if parse_level(&level).is_some() {
                self.logging.level = level;
            }
        }
        if let Ok(dir) = std::env::var("FOREIGN_BRIDGE_LOG_FILE") {
            self.logging.file = Some(dir);
        }
        if std::env::var("FOREIGN_BRIDGE_LOG_JSON").is_ok() {
            self.logging.format = LogFormat::Json;
        }
        if std::env::var("FOREIGN_BRIDGE_LOG_SPANS").is_ok() {
            self.logging.spans = true;
        }

        if let Ok(list) = std::env::var("FOREIGN_BRIDGE_CONVENTIONS") {
            if let Some(conventions) = parse_conventions(&list) {
                self.registry.enabled_conventions = conventions;
            }
        }
        if let Ok(val) = std::env::var("FOREIGN_BRIDGE_TRACE_ACCESS") {
            self.buffer.trace_access = val == "1" || val.eq_ignore_ascii_case("true");
        }

        self
    }

    fn validate(&self) -> Result<()> {
        if parse_level(&self.logging.level).is_none() {
            return Err(InteropError::Config(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Logging section as a `LogConfig`
    pub fn log_config(&self) -> LogConfig {
        let defaults = LogConfig::default();
        LogConfig {
            level: parse_level(&self.logging.level).unwrap_or(defaults.level),
            format: self.logging.format,
            file_directory: self.logging.file.clone(),
            show_spans: self.logging.spans,
        }
    }
}

static GLOBAL_CONFIG: OnceCell<BridgeConfig> = OnceCell::new();

/// Process-wide configuration
///
/// The config passed to `install`, or defaults plus environment if nothing
/// was installed before the first read.
pub fn global_config() -> &'static BridgeConfig {
    GLOBAL_CONFIG.get_or_init(BridgeConfig::from_env)
}

/// Make `config` the process-wide configuration
///
/// Fails once the global config has been read or installed; the registry
/// and buffer paths never see it change.
pub fn install(config: BridgeConfig) -> Result<()> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| InteropError::Config("Global configuration already fixed".to_string()))
}

/// Parse "direct-pointer, managed" into tags; `None` if any name is unknown
fn parse_conventions(list: &str) -> Option<Vec<CallingConvention>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            CallingConvention::ALL
                .into_iter()
                .find(|tag| tag.name() == name)
        })
        .collect()
}
