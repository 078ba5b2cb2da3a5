use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Log configuration for sing-box
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    /// Disable logging, no output after start.
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    /// Log level. One of: `trace` `debug` `info` `warn` `error` `fatal` `panic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    /// Output file path. Will not write log to console after enable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Add time to each line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

impl Log {
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level: Some(level),
            timestamp: Some(true),
            ..Default::default()
        }
    }
}

/// Log level for sing-box logging
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}
