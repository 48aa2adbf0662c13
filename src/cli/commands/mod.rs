//! CLI command implementations
//!
//! This module contains all CLI command implementations and the helpers
//! they share for loading configuration and mapping errors to exit codes.

pub mod build;
pub mod delete;
pub mod export;
pub mod final_message;
pub mod init;
pub mod publish_output;
pub mod status;
pub mod validate;
pub mod validate_spec;

use crate::config::{load_config, parse_config, CourierConfig};
use crate::domain::{CourierError, ProjectState, Result};
use crate::core::pipeline::ExportPipeline;
use std::path::{Path, PathBuf};

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "courier.toml";

/// Exit code for a successful command
pub const EXIT_OK: i32 = 0;
/// Exit code when a job was submitted but its final message is unknown
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code for configuration, mapping and project document errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for export engine connection and submission failures
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for everything else
pub const EXIT_FATAL: i32 = 5;

/// Map an error to the process exit code
pub fn exit_code_for(err: &CourierError) -> i32 {
    match err {
        CourierError::Configuration(_)
        | CourierError::Mapping(_)
        | CourierError::Project(_)
        | CourierError::Validation(_) => EXIT_CONFIG,
        CourierError::ExportApi(_) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Load the configuration, with an optional project directory override
///
/// A missing file at the default location is not an error: defaults plus
/// `COURIER_*` overrides are used instead.
pub fn load_command_config(config_path: &str, project_dir: Option<&Path>) -> Result<CourierConfig> {
    let mut config = if config_path == DEFAULT_CONFIG_PATH && !Path::new(config_path).exists() {
        tracing::debug!("No courier.toml found, using defaults");
        let config = parse_config("")?;
        config.validate().map_err(|e| {
            CourierError::Configuration(format!("Configuration validation failed: {e}"))
        })?;
        config
    } else {
        load_config(config_path)?
    };

    if let Some(dir) = project_dir {
        config.project.dir = dir.to_path_buf();
    }
    Ok(config)
}

/// Load the configuration and open the export pipeline
///
/// Errors are printed; the `Err` side carries the exit code.
pub(crate) fn open_pipeline(
    config_path: &str,
    project_dir: Option<&PathBuf>,
) -> std::result::Result<ExportPipeline, i32> {
    match load_command_config(config_path, project_dir.map(PathBuf::as_path)) {
        Ok(config) => Ok(ExportPipeline::new(config)),
        Err(e) => {
            println!("❌ Failed to load configuration");
            println!("   Error: {e}");
            Err(exit_code_for(&e))
        }
    }
}

/// Load the project document, or an empty one if it cannot be read
///
/// Commands that only talk to the export engine still honour per-project
/// settings when a project document is around.
pub(crate) fn project_or_default(pipeline: &ExportPipeline) -> ProjectState {
    pipeline.jobs().load().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "No project document, using configuration only");
        ProjectState::default()
    })
}
