//! Integration tests for logging functionality

use courier::config::LoggingConfig;
use courier::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/courier");
}

// The global subscriber can only be installed once per process, so this is
// the only test in this file that initializes logging.
#[test]
fn test_init_logging_creates_log_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("debug", &config).unwrap();
    tracing::info!(test = "logging", "Log line for the file layer");
    drop(guard);

    assert!(log_path.is_dir());
    assert!(init_logging("debug", &config).is_err());
}

#[test]
fn test_invalid_level_rejected_before_install() {
    let config = LoggingConfig::default();
    assert!(init_logging("verbose", &config).is_err());
}
