//! Validate-spec command implementation
//!
//! Checks a persisted `export_job_spec.json` for the keys the export engine
//! requires.

use super::{exit_code_for, open_pipeline, EXIT_CONFIG, EXIT_OK};
use crate::core::job::ExportJobSpec;
use crate::core::pipeline::SPEC_FILE;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the validate-spec command
#[derive(Args, Debug)]
pub struct ValidateSpecArgs {
    /// Spec file (defaults to the project's export_job_spec.json)
    #[arg(long)]
    pub spec: Option<PathBuf>,

    /// Also require a job_id
    #[arg(long)]
    pub require_job_id: bool,
}

impl ValidateSpecArgs {
    /// Execute the validate-spec command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let path = match &self.spec {
            Some(p) => p.clone(),
            None => match open_pipeline(config_path, None) {
                Ok(pipeline) => pipeline.output_dir().join(SPEC_FILE),
                Err(code) => return Ok(code),
            },
        };

        println!("🔍 Validating export job spec: {}", path.display());

        let doc: serde_json::Value = match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str(&s).map_err(anyhow::Error::from))
        {
            Ok(doc) => doc,
            Err(e) => {
                println!("❌ Failed to read spec");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match ExportJobSpec::validate_document(&doc, self.require_job_id) {
            Ok(()) => {
                println!("✅ Export job spec is valid");
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_spec_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, r#"{"project_name": "P1"}"#).unwrap();

        let args = ValidateSpecArgs {
            spec: Some(path),
            require_job_id: false,
        };
        assert_eq!(args.execute("unused.toml").await.unwrap(), EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_validate_spec_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(
            &path,
            r#"{"project_name":"P1","export_list":[],"backend":[],"username":"u",
                "password":"p","authors":[],"expiry_days":0}"#,
        )
        .unwrap();

        let args = ValidateSpecArgs {
            spec: Some(path.clone()),
            require_job_id: false,
        };
        assert_eq!(args.execute("unused.toml").await.unwrap(), EXIT_OK);

        let strict = ValidateSpecArgs {
            spec: Some(path),
            require_job_id: true,
        };
        assert_eq!(strict.execute("unused.toml").await.unwrap(), EXIT_CONFIG);
    }
}
