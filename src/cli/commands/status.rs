//! Status command implementation
//!
//! Queries the export engine for the status of a job. The job id defaults
//! to the one published on the project's export template.

use super::{exit_code_for, open_pipeline, project_or_default, EXIT_CONFIG, EXIT_OK};
use crate::domain::JobId;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Job id (defaults to the published export job id)
    #[arg(long)]
    pub job_id: Option<String>,

    /// Export engine URL (overrides project and config)
    #[arg(long, env = "COURIER_API_URL")]
    pub api_url: Option<String>,

    /// Project directory (overrides project.dir)
    #[arg(short, long)]
    pub project_dir: Option<PathBuf>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export job status");

        let pipeline = match open_pipeline(config_path, self.project_dir.as_ref()) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };
        let state = project_or_default(&pipeline);

        let job_id = match &self.job_id {
            Some(raw) => JobId::new(raw.as_str()).ok(),
            None => pipeline.jobs().existing_job_id(&state),
        };
        let Some(job_id) = job_id else {
            println!("❌ No job id given and none published for this project");
            println!("   Run 'courier export' first or pass --job-id");
            return Ok(EXIT_CONFIG);
        };

        let client = match pipeline.client(&state, self.api_url.as_deref()) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };

        match client.status(&job_id).await {
            Ok(status) => {
                println!("📊 Export job {job_id}");
                println!("{}", serde_json::to_string_pretty(&status)?);
                Ok(EXIT_OK)
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Status query failed");
                println!("❌ Failed to query job status");
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
