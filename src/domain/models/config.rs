use serde::{Deserialize, Serialize};

/// Main configuration structure for the shared resource cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How creation and teardown are serialized across keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    /// One gate per key; different keys create and tear down in parallel.
    #[default]
    PerKey,
    /// A single gate shared by every key.
    Global,
}

impl LockStrategy {
    /// Configuration spelling of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerKey => "per_key",
            Self::Global => "global",
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Gate granularity for creation and teardown
    #[serde(default)]
    pub lock_strategy: LockStrategy,

    /// Upper bound on a single creator invocation, in milliseconds.
    /// `None` waits for the creator indefinitely.
    #[serde(default)]
    pub creation_timeout_ms: Option<u64>,
}

impl CacheConfig {
    /// Serialize all keys behind one gate.
    pub fn global() -> Self {
        Self {
            lock_strategy: LockStrategy::Global,
            ..Default::default()
        }
    }

    /// Set the creation timeout.
    pub const fn with_creation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.creation_timeout_ms = Some(timeout_ms);
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
