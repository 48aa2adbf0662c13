//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Courier configuration file and the mapping table it points to.

use super::{load_command_config, EXIT_CONFIG, EXIT_OK};
use crate::core::mapping::MappingTable;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Skip loading the mapping table
    #[arg(long)]
    pub skip_mapping: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_command_config(config_path, None) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.skip_mapping {
            match MappingTable::from_yaml_file(&config.mapping.table_path) {
                Ok(table) => println!("✅ Mapping table is valid ({} rules)", table.len()),
                Err(e) => {
                    println!("❌ Mapping table is invalid");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        }

        let api_url = if config.export_api.base_url.is_empty() {
            "(from project)"
        } else {
            config.export_api.base_url.as_str()
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Project Dir: {}", config.project.dir.display());
        println!("  Project State: {}", config.project.state_path().display());
        println!("  Export Template: {}", config.project.export_template_id);
        println!("  Mapping Table: {}", config.mapping.table_path.display());
        println!("  Export API: {api_url}");
        println!(
            "  Poll Policy: {} attempts, {}s backoff",
            config.export_api.max_poll_attempts, config.export_api.poll_backoff_seconds
        );
        println!("  Backends: {}", config.export.backends.join(", "));
        println!("  Expiry Days: {}", config.export.expiry_days);
        println!(
            "  Password: {}",
            if config.export.password.is_some() {
                "configured"
            } else {
                "generated per job"
            }
        );
        println!();
        Ok(EXIT_OK)
    }
}
