// src/utils/logger.rs

//! Structured JSON-lines output for the alert services. Each line carries the
//! component that wrote it plus any fields attached with `add_context`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "trace" => Ok(LogLevel::Debug),
            _ => Err(()),
        }
    }
}

/// One emitted line.
#[derive(Serialize)]
struct LogLine<'a> {
    timestamp: String,
    level: LogLevel,
    message: &'a str,
    #[serde(skip_serializing_if = "no_context")]
    context: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Value>,
}

fn no_context(context: &&Map<String, Value>) -> bool {
    context.is_empty()
}

/// Errors and warnings go to stderr, the rest to stdout.
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    context: Map<String, Value>,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            context: Map::new(),
        }
    }

    /// Level from `LOG_LEVEL`, falling back to info.
    pub fn from_env() -> Self {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(LogLevel::Info);
        Self::new(level)
    }

    pub fn for_component(component: &str) -> Self {
        let mut logger = Self::from_env();
        logger.add_context("component", Value::from(component));
        logger
    }

    pub fn add_context(&mut self, key: &str, value: Value) {
        self.context.insert(key.to_string(), value);
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    fn render(&self, level: LogLevel, message: &str, meta: Option<&Value>) -> String {
        let line = LogLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            message,
            context: &self.context,
            meta,
        };
        serde_json::to_string(&line).unwrap_or_else(|_| format!("{:?} {}", level, message))
    }

    fn emit(&self, level: LogLevel, message: &str, meta: Option<&Value>) {
        if !self.enabled(level) {
            return;
        }
        let rendered = self.render(level, message, meta);
        match level {
            LogLevel::Error | LogLevel::Warn => eprintln!("{}", rendered),
            LogLevel::Info | LogLevel::Debug => println!("{}", rendered),
        }
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message, None);
    }

    pub fn error_with_meta(&self, message: &str, meta: Option<&Value>) {
        self.emit(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message, None);
    }

    pub fn warn_with_meta(&self, message: &str, meta: Option<&Value>) {
        self.emit(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message, None);
    }

    pub fn info_with_meta(&self, message: &str, meta: Option<&Value>) {
        self.emit(LogLevel::Info, message, meta);
    }

    pub fn debug_with_meta(&self, message: &str, meta: Option<&Value>) {
        self.emit(LogLevel::Debug, message, meta);
    }
}

static SHARED_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Crate-wide logger for code that has no component logger of its own.
pub fn logger() -> &'static Logger {
    SHARED_LOGGER.get_or_init(|| Logger::for_component("market_sentinel"))
}

#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        $crate::utils::logger::logger().warn($msg)
    };
    ($msg:expr, $meta:expr) => {
        $crate::utils::logger::logger().warn_with_meta($msg, Some(&$meta))
    };
}
