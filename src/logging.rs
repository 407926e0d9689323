//! Structured logging and tracing for Loadshare
//!
//! This module provides logging on top of the tracing ecosystem: a console
//! layer, an optional daily-rolling file layer, and a small structured
//! logger that tags every line with the emitting component and, where
//! relevant, the loadpoint, vehicle or metered entity involved.

use crate::config::LoggingConfig;
use crate::error::{LoadshareError, Result};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;

            let console_level = config
                .console_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);
            let file_level = config
                .file_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);

            let filter = build_env_filter(min_level(console_level, file_level));

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, console_level);
                return Ok(());
            }

            init_file_logging(config, filter, console_level, file_level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(LoadshareError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("loadshare={},rusqlite=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("LOADSHARE_DISABLE_FILE_LOG").is_some()
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, console_level: Level) {
    let console_layer = {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if json_format {
            layer
                .json()
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        } else {
            layer
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        }
    };

    // A test harness may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();

    info!(
        "Logging initialized - console_level: {:?}, console-only",
        console_level
    );
}

fn init_file_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    console_level: Level,
    file_level: Level,
) -> Result<()> {
    let registry = tracing_subscriber::registry().with(filter);

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("loadshare")
        .filename_suffix("log")
        .max_log_files(config.backup_count as usize)
        .build({
            // If config.file is a file path, use its parent dir; otherwise treat as dir
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| LoadshareError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(file_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(file_level))
                .boxed()
        }
    };

    let subscriber = registry.with(file_layer);

    if config.console_output {
        let console_layer = {
            let base = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false);
            if config.json_format {
                base.json()
                    .with_filter(LevelFilter::from_level(console_level))
                    .boxed()
            } else {
                base.with_filter(LevelFilter::from_level(console_level))
                    .boxed()
            }
        };
        subscriber.with(console_layer).init();
    } else {
        subscriber.init();
    }

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, file: {}",
        console_level, file_level, config.file
    );
    Ok(())
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(LoadshareError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

fn level_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        Level::ERROR => 4,
    }
}

fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}

/// Context information for log messages
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "coordinator", "prioritizer", "metrics")
    pub component: String,

    /// Loadpoint the message concerns
    pub loadpoint: Option<String>,

    /// Metered entity (e.g. "home", "grid")
    pub entity: Option<String>,

    /// Additional context fields
    pub extra_fields: BTreeMap<String, String>,
}

impl LogContext {
    /// Create a new log context
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            loadpoint: None,
            entity: None,
            extra_fields: BTreeMap::new(),
        }
    }

    /// Set loadpoint
    pub fn with_loadpoint(mut self, loadpoint: String) -> Self {
        self.loadpoint = Some(loadpoint);
        self
    }

    /// Set metered entity
    pub fn with_entity(mut self, entity: String) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Add extra field
    pub fn with_field(mut self, key: &str, value: String) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }
}

/// Structured logger with context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
}

impl StructuredLogger {
    /// Create a new structured logger with context
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn info(&self, message: &str) {
        let fields = self.format_fields();
        info!(%fields, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        let fields = self.format_fields();
        warn!(%fields, "{}", message);
    }

    pub fn error(&self, message: &str) {
        let fields = self.format_fields();
        error!(%fields, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        let fields = self.format_fields();
        debug!(%fields, "{}", message);
    }

    pub fn trace(&self, message: &str) {
        let fields = self.format_fields();
        trace!(%fields, "{}", message);
    }

    fn format_fields(&self) -> String {
        let mut fields = vec![format!("component={}", self.context.component)];

        if let Some(ref loadpoint) = self.context.loadpoint {
            fields.push(format!("loadpoint={}", loadpoint));
        }

        if let Some(ref entity) = self.context.entity {
            fields.push(format!("entity={}", entity));
        }

        for (key, value) in &self.context.extra_fields {
            fields.push(format!("{}={}", key, value));
        }

        fields.join(",")
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

/// Create a logger with full context
pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("ERROR").unwrap(), Level::ERROR);
        assert!(parse_log_level("invalid").is_err());
    }

    #[test]
    fn test_min_level_prefers_verbose() {
        assert_eq!(min_level(Level::INFO, Level::DEBUG), Level::DEBUG);
        assert_eq!(min_level(Level::WARN, Level::ERROR), Level::WARN);
    }

    #[test]
    fn test_log_context() {
        let context = LogContext::new("metrics")
            .with_loadpoint("garage".to_string())
            .with_entity("home".to_string())
            .with_field("slot", "12:15".to_string());

        assert_eq!(context.component, "metrics");
        assert_eq!(context.loadpoint.as_deref(), Some("garage"));
        assert_eq!(context.entity.as_deref(), Some("home"));
        assert_eq!(context.extra_fields.get("slot"), Some(&"12:15".to_string()));
    }

    #[test]
    fn test_format_fields_order() {
        let logger = get_logger_with_context(
            LogContext::new("coordinator")
                .with_loadpoint("carport".to_string())
                .with_field("b", "2".to_string())
                .with_field("a", "1".to_string()),
        );
        assert_eq!(
            logger.format_fields(),
            "component=coordinator,loadpoint=carport,a=1,b=2"
        );
    }

    #[test]
    fn test_structured_logger() {
        init_logging(&LoggingConfig::default()).ok();

        let logger = get_logger("test_component");
        logger.info("Test info message");
        logger.debug("Test debug message");
        logger.warn("Test warning message");
        logger.error("Test error message");
        logger.trace("Test trace message");
    }
}
