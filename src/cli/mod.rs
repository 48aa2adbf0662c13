//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Courier using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Courier - export mapping resolver and export job client
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version, about, long_about = None)]
#[command(author = "Courier Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = commands::DEFAULT_CONFIG_PATH, env = "COURIER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "COURIER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the mapping table and write the export job spec
    Build(commands::build::BuildArgs),

    /// Build, submit and poll an export job
    Export(commands::export::ExportArgs),

    /// Show the status of an export job
    Status(commands::status::StatusArgs),

    /// Fetch the final message of an export job and publish it
    FinalMessage(commands::final_message::FinalMessageArgs),

    /// Delete an exported project on the export engine
    Delete(commands::delete::DeleteArgs),

    /// Check an export job spec file for required keys
    ValidateSpec(commands::validate_spec::ValidateSpecArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Publish a template output path into the project document
    PublishOutput(commands::publish_output::PublishOutputArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Execute the selected command, returning the process exit code
    pub async fn execute(&self) -> anyhow::Result<i32> {
        match &self.command {
            Commands::Build(args) => args.execute(&self.config).await,
            Commands::Export(args) => args.execute(&self.config).await,
            Commands::Status(args) => args.execute(&self.config).await,
            Commands::FinalMessage(args) => args.execute(&self.config).await,
            Commands::Delete(args) => args.execute(&self.config).await,
            Commands::ValidateSpec(args) => args.execute(&self.config).await,
            Commands::ValidateConfig(args) => args.execute(&self.config).await,
            Commands::PublishOutput(args) => args.execute(&self.config).await,
            Commands::Init(args) => args.execute().await,
        }
    }
}
