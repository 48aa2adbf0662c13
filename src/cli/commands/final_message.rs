//! Final-message command implementation
//!
//! Re-fetches the final message of an export job, retrying while the export
//! engine answers HTTP 425 unless `--once` is given, and publishes it into
//! the project document.

use super::{
    exit_code_for, open_pipeline, project_or_default, EXIT_CONFIG, EXIT_OK, EXIT_PARTIAL,
};
use crate::domain::JobId;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the final-message command
#[derive(Args, Debug)]
pub struct FinalMessageArgs {
    /// Job id (defaults to the published export job id)
    #[arg(long)]
    pub job_id: Option<String>,

    /// Export engine URL (overrides project and config)
    #[arg(long, env = "COURIER_API_URL")]
    pub api_url: Option<String>,

    /// Do not write the result back into the project document
    #[arg(long)]
    pub no_publish: bool,

    /// Ask once instead of polling while the job is still running
    #[arg(long)]
    pub once: bool,

    /// Project directory (overrides project.dir)
    #[arg(short, long)]
    pub project_dir: Option<PathBuf>,
}

impl FinalMessageArgs {
    /// Execute the final-message command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let pipeline = match open_pipeline(config_path, self.project_dir.as_ref()) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };
        let mut state = project_or_default(&pipeline);

        let job_id = match &self.job_id {
            Some(raw) => JobId::new(raw.as_str()).ok(),
            None => pipeline.jobs().existing_job_id(&state),
        };
        let Some(job_id) = job_id else {
            println!("❌ No job id given and none published for this project");
            return Ok(EXIT_CONFIG);
        };

        let client = match pipeline.client(&state, self.api_url.as_deref()) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };

        tracing::info!(job_id = %job_id, once = self.once, "Fetching final message");
        let (result, failure) = if self.once {
            match client.fetch_final_message(&job_id).await {
                Ok(result) => (Some(result), None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            let outcome = client.poll_final_message(&job_id).await;
            (outcome.result, outcome.failure)
        };
        let Some(result) = result else {
            println!("⚠️  Final message for job {job_id} unavailable");
            if let Some(reason) = &failure {
                println!("   Reason: {reason}");
            }
            return Ok(EXIT_PARTIAL);
        };

        if !self.no_publish {
            if let Err(e) = pipeline.jobs().publish(&mut state, &job_id, Some(&result)) {
                println!("❌ Failed to publish final message");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        }

        println!("{}", result.render_summary("export"));
        Ok(EXIT_OK)
    }
}
