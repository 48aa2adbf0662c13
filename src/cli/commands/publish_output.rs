//! Publish-output command implementation
//!
//! Records a local output path of a template as a host-qualified value in
//! the template's `published` map, so mapping rules can pick it up through
//! `src_published_key`.

use super::{exit_code_for, open_pipeline, EXIT_OK};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the publish-output command
#[derive(Args, Debug)]
pub struct PublishOutputArgs {
    /// Template the output belongs to
    #[arg(long)]
    pub template_id: String,

    /// Key in the template's published map
    #[arg(long)]
    pub key: String,

    /// Output path; relative paths are taken from the project directory
    pub path: PathBuf,

    /// Project directory (overrides project.dir)
    #[arg(short, long)]
    pub project_dir: Option<PathBuf>,
}

impl PublishOutputArgs {
    /// Execute the publish-output command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let pipeline = match open_pipeline(config_path, self.project_dir.as_ref()) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };

        let result = pipeline.jobs().load().and_then(|mut state| {
            let ctx = pipeline.resolve_context(&state);
            let local = if self.path.is_absolute() {
                self.path.clone()
            } else {
                ctx.project_root().join(&self.path)
            };
            let value = ctx.hostify(&local);
            pipeline
                .jobs()
                .publish_output(&mut state, self.template_id.trim(), self.key.trim(), &value)
                .map(|()| value)
        });

        match result {
            Ok(value) => {
                println!(
                    "✅ Published {}.{} = {value}",
                    self.template_id.trim(),
                    self.key.trim()
                );
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to publish output");
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectState;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_publish_relative_output() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("project.yaml"),
            "name: P1\nproject_path: nextgen:/mnt/projects/P1\ntemplates:\n  - id: rnaseq\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("courier.custom.toml"),
            "[project]\ndir = \".\"\n",
        )
        .unwrap();

        let args = PublishOutputArgs {
            template_id: "rnaseq".to_string(),
            key: "salmon_dir".to_string(),
            path: PathBuf::from("rnaseq/salmon"),
            project_dir: None,
        };
        let config_path = dir.path().join("courier.custom.toml");
        let code = args
            .execute(config_path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);

        let state = ProjectState::from_yaml_str(
            &fs::read_to_string(dir.path().join("project.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            state.template("rnaseq").unwrap().published_str("salmon_dir"),
            Some("nextgen:/mnt/projects/P1/rnaseq/salmon")
        );
    }
}
