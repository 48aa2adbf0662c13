//! Delete command implementation

use super::{exit_code_for, open_pipeline, project_or_default, EXIT_OK};
use clap::Args;

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Id of the exported project to delete
    #[arg(long)]
    pub project_id: String,

    /// Export engine URL (overrides project and config)
    #[arg(long, env = "COURIER_API_URL")]
    pub api_url: Option<String>,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let pipeline = match open_pipeline(config_path, None) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };
        let state = project_or_default(&pipeline);

        let result = match pipeline.client(&state, self.api_url.as_deref()) {
            Ok(client) => client.delete_project(&self.project_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                println!("🗑️  Deleted exported project {}", self.project_id.trim());
                if !response.is_null() {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                Ok(EXIT_OK)
            }
            Err(e) => {
                tracing::error!(project_id = %self.project_id, error = %e, "Delete failed");
                println!("❌ Failed to delete exported project");
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
