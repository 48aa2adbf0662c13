//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "courier.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Courier configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your export engine URL", self.output);
                println!("  2. Set COURIER_EXPORT_PASSWORD in .env, or let Courier generate one");
                println!("  3. Validate configuration: courier validate-config");
                println!("  4. Preview the export list: courier build --list");
                println!("  5. Run export: courier export");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Courier Configuration File

[application]
log_level = "info"
dry_run = false

[project]
dir = "."
state_file = "project.yaml"
export_template_id = "export"
filter_used_templates = true

[mapping]
table_path = "templates/export/export_mapping.table.yaml"

[export_api]
base_url = "http://localhost:9500/export"
max_poll_attempts = 4
poll_backoff_seconds = 5

[export]
backends = ["apache", "owncloud", "sftp"]
expiry_days = 0

[logging]
local_enabled = false
local_path = "/var/log/courier"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Courier Configuration File
#
# Values of the form ${VAR} are substituted from the environment (a .env
# file next to the binary is loaded first). Every key can also be
# overridden with COURIER_<SECTION>_<KEY>, e.g. COURIER_EXPORT_API_BASE_URL.

# Runtime environment (development, staging, production)
environment = "development"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Resolve and write the job spec, never submit
dry_run = false

# ============================================================================
# Project
# ============================================================================
[project]
# Directory holding the project document; relative to this file
dir = "."

# Project document file name
state_file = "project.yaml"

# Template entry receiving the job id and final message
export_template_id = "export"

# Only resolve rules for templates the project actually uses
filter_used_templates = true

# ============================================================================
# Mapping Table
# ============================================================================
[mapping]
# Ordered export mapping rules; relative to this file
table_path = "templates/export/export_mapping.table.yaml"

# ============================================================================
# Export Engine API
# ============================================================================
[export_api]
# Base URL; "/export" is appended when missing. Can be left empty when the
# project sets export_engine_api_url on its export template.
base_url = "http://localhost:9500/export"

# Timeout for the submission POST
submit_timeout_seconds = 30

# Timeout for each final-message GET
poll_timeout_seconds = 15

# Final-message GETs before giving up (1-20)
max_poll_attempts = 4

# After HTTP 425, attempt n waits n times this many seconds
poll_backoff_seconds = 5

# TLS certificate verification (cannot be disabled in production)
tls_verify = true

# ============================================================================
# Export Job Defaults
# ============================================================================
# The export template params export_engine_backends, export_username,
# export_password and export_expiry_days take precedence over these.
[export]
backends = ["apache", "owncloud", "sftp"]

# Days until the export expires, 0 for never
expiry_days = 0

# Derived from the project name when unset
# username = "smith"

# Generated per job when unset
# password = "${COURIER_EXPORT_PASSWORD}"

# Write export_job_spec.json and API responses to <project>/<export_template_id>/
write_spec = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false

# Log directory
local_path = "/var/log/courier"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "courier.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "courier.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse_and_validate() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(config.export.backends.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("courier.toml");
        fs::write(&path, "# existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");
    }
}
