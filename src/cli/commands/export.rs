//! Export command implementation
//!
//! This module implements the `export` command: build the job spec, submit
//! it to the export engine, publish the job id, poll for the final message
//! and publish the result.

use super::{exit_code_for, open_pipeline, EXIT_OK};
use crate::core::job::JobState;
use crate::core::pipeline::RunOptions;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project directory (overrides project.dir)
    #[arg(short, long)]
    pub project_dir: Option<PathBuf>,

    /// Dry run mode - build the job spec without submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Export engine URL (overrides project and config)
    #[arg(long, env = "COURIER_API_URL")]
    pub api_url: Option<String>,

    /// Submit only, do not wait for the final message
    #[arg(long)]
    pub no_poll: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let pipeline = match open_pipeline(config_path, self.project_dir.as_ref()) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };

        let options = RunOptions {
            dry_run: self.dry_run,
            skip_poll: self.no_poll,
            api_url: self.api_url.clone(),
        };

        let report = match pipeline.run(&options).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                println!("❌ Export failed");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        match &report.state {
            JobState::Built => {
                println!("🔍 Dry run: export job spec built, not submitted");
                println!("   Entries: {}", report.entries);
                if let Some(path) = &report.spec_path {
                    println!("   Spec: {}", path.display());
                }
                return Ok(EXIT_OK);
            }
            JobState::Submitted(job_id) => {
                println!("✅ Export job submitted: {job_id}");
                println!("   Not polling for the final message");
            }
            JobState::Failed => {
                if let Some(job_id) = &report.job_id {
                    println!("⚠️  Export job {job_id} submitted, final message unavailable");
                }
                if let Some(reason) = &report.poll_failure {
                    println!("   Reason: {reason}");
                }
            }
            _ => {}
        }

        if let Some(result) = &report.result {
            println!("{}", result.render_summary("export"));
        }

        Ok(report.exit_code())
    }
}
