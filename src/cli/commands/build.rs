//! Build command implementation
//!
//! Resolves the mapping table against the project and writes
//! `export_job_spec.json` without contacting the export engine.

use super::{exit_code_for, open_pipeline, EXIT_OK};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project directory (overrides project.dir)
    #[arg(short, long)]
    pub project_dir: Option<PathBuf>,

    /// Print the export list
    #[arg(long)]
    pub list: bool,
}

impl BuildArgs {
    /// Execute the build command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Building export job spec");

        let pipeline = match open_pipeline(config_path, self.project_dir.as_ref()) {
            Ok(p) => p,
            Err(code) => return Ok(code),
        };

        let built = match pipeline.build() {
            Ok(b) => b,
            Err(e) => {
                println!("❌ Failed to build export job spec");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("✅ Export job spec built for {}", built.spec.project_name);
        println!("   Entries: {}", built.spec.export_list.len());
        println!("   Backends: {}", built.spec.backend.as_slice().join(", "));
        if let Some(path) = &built.spec_path {
            println!("   Written to: {}", path.display());
        }

        if self.list {
            println!();
            for entry in &built.spec.export_list {
                println!("  {} {}:{} -> {}", entry.mode, entry.host, entry.src, entry.dest);
            }
        }

        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_defaults() {
        let args = BuildArgs {
            project_dir: None,
            list: false,
        };
        assert!(args.project_dir.is_none());
    }
}
