//! Logging configuration and subscriber setup for caseport.
//!
//! Library crates only emit `tracing` events; binaries call [`init`] once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Log level for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Check if this level should log messages at the given level
    pub fn should_log(&self, level: LogLevel) -> bool {
        *self >= level
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level to output
    #[serde(default)]
    pub level: LogLevel,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// Enable timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Enable colors (for terminal output)
    #[serde(default = "default_true")]
    pub colors: bool,
    /// Per-crate levels, keyed by target (`caseport_merge`).
    #[serde(default)]
    pub component_levels: BTreeMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            colors: true,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    /// Get the effective log level for a component
    pub fn effective_level(&self, component: Option<&str>) -> LogLevel {
        component
            .and_then(|c| self.component_levels.get(c).copied())
            .unwrap_or(self.level)
    }

    /// `EnvFilter` directive: `info,caseport_merge=debug`.
    pub fn env_filter(&self) -> String {
        let mut directive = self.level.as_str().to_string();
        for (component, level) in &self.component_levels {
            directive.push(',');
            directive.push_str(component);
            directive.push('=');
            directive.push_str(level.as_str());
        }
        directive
    }
}

/// Install the global subscriber, logging to stderr.
///
/// `RUST_LOG` wins over the configured levels when set. Returns false when a
/// subscriber was already installed, which is not an error.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.colors)
        .with_writer(std::io::stderr);
    let installed = match (config.format, config.timestamps) {
        (LogFormat::Json, _) => builder.json().try_init(),
        (LogFormat::Compact, true) => builder.compact().try_init(),
        (LogFormat::Compact, false) => builder.compact().without_time().try_init(),
        (LogFormat::Plain, true) => builder.try_init(),
        (LogFormat::Plain, false) => builder.without_time().try_init(),
    };
    installed.is_ok()
}
