//! Configuration management for Courier.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Courier uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `COURIER_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use courier::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("courier.toml")?;
//!
//! println!("Export API: {}", config.export_api.base_url);
//! println!("Project: {}", config.project.state_path().display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run mode
//! - [`ProjectConfig`] - Project directory, state file and export template id
//! - [`MappingConfig`] - Mapping table location
//! - [`ExportApiConfig`] - Export engine URL, timeouts and poll policy
//! - [`ExportConfig`] - Backends, expiry and export credentials
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [project]
//! dir = "."
//! export_template_id = "export"
//!
//! [mapping]
//! table_path = "templates/export/export_mapping.table.yaml"
//!
//! [export_api]
//! base_url = "http://export.example.org:9500/export"
//! max_poll_attempts = 4
//! poll_backoff_seconds = 5
//!
//! [export]
//! backends = ["apache", "owncloud", "sftp"]
//! password = "${COURIER_EXPORT_PASSWORD}"
//! ```
//!
//! Settings on the project's export template (`export_engine_api_url`,
//! `export_engine_backends`, `export_username`, `export_password`,
//! `export_expiry_days`) take precedence over this file.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CourierConfig, Environment, ExportApiConfig, ExportConfig, LoggingConfig,
    MappingConfig, ProjectConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
