use crate::error::SqlResult;
use serde::Deserialize;

/// Behaviour of the timing proxies.
///
/// The defaults keep every distinct SQL text on its own timer and record only
/// successful calls. Can be built in code or read from TOML:
///
/// ```toml
/// max_sql_length = 120
/// record_failed_calls = true
/// log_sql = true
/// sql_log_level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Truncate normalized SQL to this many bytes before it becomes part of a
    /// metric name. `None` (default) keeps the whole statement.
    pub max_sql_length: Option<usize>,
    /// Record the duration of timed calls that fail. Default `false`.
    pub record_failed_calls: bool,
    /// Emit a `sqlmetrics.sql` event for every timed execution.
    pub log_sql: bool,
    /// Level of the SQL events.
    pub sql_log_level: LogLevel,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub log_sql_max_length: Option<usize>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_sql_length: None,
            record_failed_calls: false,
            log_sql: false,
            sql_log_level: LogLevel::Debug,
            log_sql_max_length: Some(200),
        }
    }
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Truncate normalized SQL in metric names.
    ///
    /// Statements sharing their first `len` bytes will share a timer.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Record durations of failed timed calls too.
    pub fn record_failed_calls(mut self) -> Self {
        self.record_failed_calls = true;
        self
    }

    /// Log every timed execution at `level`.
    pub fn log_sql(mut self, level: LogLevel) -> Self {
        self.log_sql = true;
        self.sql_log_level = level;
        self
    }

    /// Set maximum logged SQL length.
    pub fn log_sql_max_length(mut self, len: usize) -> Self {
        self.log_sql_max_length = Some(len);
        self
    }

    /// Log SQL untruncated.
    pub fn log_sql_no_truncate(mut self) -> Self {
        self.log_sql_max_length = None;
        self
    }
}

/// `tracing` level, deserializable from lowercase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
