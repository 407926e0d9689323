use loadshare::config::LoggingConfig;
use loadshare::logging::{
    LogContext, get_logger, get_logger_with_context, init_logging, parse_log_level,
};
use tracing::Level;

#[test]
fn file_logging_initializes_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        level: "debug".to_string(),
        file: dir.path().join("loadshare.log").to_string_lossy().to_string(),
        console_output: false,
        ..LoggingConfig::default()
    };

    init_logging(&config).unwrap();
    // later calls are no-ops
    init_logging(&config).unwrap();

    get_logger("test").info("file logging ready");
    get_logger_with_context(
        LogContext::new("metrics")
            .with_entity("home".to_string())
            .with_field("slot", "00:15".to_string()),
    )
    .debug("slot persisted");
}

#[test]
fn level_names_are_case_insensitive() {
    assert_eq!(parse_log_level("Warn").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    assert!(parse_log_level("verbose").is_err());
}
