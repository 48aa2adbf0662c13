//! Configuration schema types
//!
//! This module defines the configuration structure for Courier.

use crate::config::SecretString;
use crate::domain::EXPORT_TEMPLATE_ID;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main Courier configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Project location and layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Mapping table location
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Export engine connection
    #[serde(default)]
    pub export_api: ExportApiConfig,

    /// Export job defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CourierConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.project.validate()?;
        self.mapping.validate()?;
        self.export_api.validate(&self.environment)?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (resolve and build the job spec, never submit)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding the project document
    #[serde(default = "default_project_dir")]
    pub dir: PathBuf,

    /// Project document file name, relative to `dir`
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Template entry that receives export job state
    #[serde(default = "default_export_template_id")]
    pub export_template_id: String,

    /// Skip rules for templates the project never rendered
    #[serde(default = "default_true")]
    pub filter_used_templates: bool,
}

impl ProjectConfig {
    fn validate(&self) -> Result<(), String> {
        if self.state_file.trim().is_empty() {
            return Err("project.state_file cannot be empty".to_string());
        }
        if self.export_template_id.trim().is_empty() {
            return Err("project.export_template_id cannot be empty".to_string());
        }
        Ok(())
    }

    /// Full path of the project document
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(&self.state_file)
    }

    /// Directory the job spec and responses are written to
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(&self.export_template_id)
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            dir: default_project_dir(),
            state_file: default_state_file(),
            export_template_id: default_export_template_id(),
            filter_used_templates: true,
        }
    }
}

/// Mapping table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Path of the mapping table YAML
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,
}

impl MappingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.table_path.as_os_str().is_empty() {
            return Err("mapping.table_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
        }
    }
}

/// Export engine API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportApiConfig {
    /// Base URL, with or without the trailing `/export`
    #[serde(default)]
    pub base_url: String,

    /// Timeout for the submission POST
    #[serde(default = "default_submit_timeout_seconds")]
    pub submit_timeout_seconds: u64,

    /// Timeout for each final-message GET
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,

    /// Maximum final-message GETs
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Backoff unit; attempt n waits n times this after HTTP 425
    #[serde(default = "default_poll_backoff_seconds")]
    pub poll_backoff_seconds: u64,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl ExportApiConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        let url = self.base_url.trim();
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "export_api.base_url must start with http:// or https://, got '{url}'"
            ));
        }

        if self.submit_timeout_seconds == 0 || self.poll_timeout_seconds == 0 {
            return Err("export_api timeouts must be > 0".to_string());
        }

        if self.max_poll_attempts == 0 || self.max_poll_attempts > 20 {
            return Err("export_api.max_poll_attempts must be between 1 and 20".to_string());
        }

        if self.poll_backoff_seconds > 300 {
            return Err("export_api.poll_backoff_seconds must be <= 300".to_string());
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS verification cannot be disabled in production (export_api.tls_verify)"
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for ExportApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            submit_timeout_seconds: default_submit_timeout_seconds(),
            poll_timeout_seconds: default_poll_timeout_seconds(),
            max_poll_attempts: default_max_poll_attempts(),
            poll_backoff_seconds: default_poll_backoff_seconds(),
            tls_verify: true,
        }
    }
}

/// Export job defaults
///
/// Values set on the project's export template params take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Backends to publish to
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    /// Days until the export expires, 0 for never
    #[serde(default)]
    pub expiry_days: u32,

    /// Export username; derived from the project name when unset
    #[serde(default)]
    pub username: Option<String>,

    /// Export password; generated when unset
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Persist `export_job_spec.json` next to the project
    #[serde(default = "default_true")]
    pub write_spec: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backends.iter().any(|b| b.trim().is_empty()) {
            return Err("export.backends cannot contain empty names".to_string());
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            expiry_days: 0,
            username: None,
            password: None,
            write_spec: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_state_file() -> String {
    "project.yaml".to_string()
}

fn default_export_template_id() -> String {
    EXPORT_TEMPLATE_ID.to_string()
}

fn default_table_path() -> PathBuf {
    PathBuf::from("templates/export/export_mapping.table.yaml")
}

fn default_submit_timeout_seconds() -> u64 {
    30
}

fn default_poll_timeout_seconds() -> u64 {
    15
}

fn default_max_poll_attempts() -> u32 {
    4
}

fn default_poll_backoff_seconds() -> u64 {
    5
}

fn default_backends() -> Vec<String> {
    vec![
        "apache".to_string(),
        "owncloud".to_string(),
        "sftp".to_string(),
    ]
}

fn default_local_path() -> String {
    "/var/log/courier".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CourierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.export_api.max_poll_attempts, 4);
        assert_eq!(config.export_api.poll_backoff_seconds, 5);
        assert_eq!(config.project.export_template_id, "export");
        assert_eq!(config.export.backends, vec!["apache", "owncloud", "sftp"]);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_api_validation() {
        let mut config = ExportApiConfig {
            base_url: "ftp://engine".to_string(),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_err());

        config.base_url = "https://engine/export".to_string();
        assert!(config.validate(&Environment::Development).is_ok());

        config.max_poll_attempts = 0;
        assert!(config.validate(&Environment::Development).is_err());

        config.max_poll_attempts = 4;
        config.submit_timeout_seconds = 0;
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_tls_verification_in_production() {
        let config = ExportApiConfig {
            tls_verify: false,
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Production).is_err());
    }

    #[test]
    fn test_project_paths() {
        let project = ProjectConfig {
            dir: PathBuf::from("/p/P1"),
            ..Default::default()
        };
        assert_eq!(project.state_path(), PathBuf::from("/p/P1/project.yaml"));
        assert_eq!(project.output_dir(), PathBuf::from("/p/P1/export"));
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());
        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_backend_rejected() {
        let config = ExportConfig {
            backends: vec!["apache".to_string(), " ".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_toml() {
        let config: CourierConfig = toml::from_str("[export_api]\nbase_url = \"http://e\"\n").unwrap();
        assert_eq!(config.export_api.base_url, "http://e");
        assert_eq!(config.export_api.submit_timeout_seconds, 30);
        assert!(config.project.filter_used_templates);
        assert!(config.export.password.is_none());
    }
}
