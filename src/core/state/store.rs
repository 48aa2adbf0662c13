//! Project document persistence and job state publishing
//!
//! Job identifiers and final messages are written into the `published` map
//! of the project's export template entry, so a re-run can pick up the job
//! it already submitted.

use crate::core::job::JobResult;
use crate::domain::{CourierError, HostPath, JobId, ProjectState, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Published key holding the submitted job id
pub const KEY_JOB_ID: &str = "export_job_id";
/// Published key holding the final job status
pub const KEY_STATUS: &str = "export_status";
/// Published key holding the main report location
pub const KEY_MAIN_REPORT: &str = "export_main_report";
/// Published key holding the final message snapshot
pub const KEY_FINAL_MESSAGE: &str = "export_final_message";

/// Durable storage for the project document
pub trait ProjectStore {
    /// Load the project document
    fn load(&self) -> Result<ProjectState>;

    /// Replace the stored document atomically
    fn save(&self, state: &ProjectState) -> Result<()>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}

/// `project.yaml` on the local filesystem
#[derive(Debug, Clone)]
pub struct YamlProjectStore {
    path: PathBuf,
}

impl YamlProjectStore {
    /// Store backed by the YAML file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project.yaml".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl ProjectStore for YamlProjectStore {
    fn load(&self) -> Result<ProjectState> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            CourierError::Project(format!(
                "Failed to read project file {}: {e}",
                self.path.display()
            ))
        })?;
        ProjectState::from_yaml_str(&contents)
    }

    fn save(&self, state: &ProjectState) -> Result<()> {
        let yaml = state.to_yaml_string()?;
        let tmp = self.temp_path();

        fs::write(&tmp, yaml).map_err(|e| {
            CourierError::State(format!("Failed to write {}: {e}", tmp.display()))
        })?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(CourierError::State(format!(
                "Failed to replace {}: {e}",
                self.path.display()
            )));
        }

        tracing::debug!(path = %self.path.display(), "Saved project document");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Record a job on the export template entry without persisting
///
/// Creates the entry if the project has none. With a result, also records
/// its status, main report and a full snapshot of the final message.
pub fn record_job(
    state: &mut ProjectState,
    export_template_id: &str,
    job_id: &JobId,
    result: Option<&JobResult>,
) -> Result<()> {
    let entry = state.template_entry(export_template_id);
    let published = &mut entry.published;

    published.insert(KEY_JOB_ID.into(), Value::from(job_id.as_str()));

    if let Some(result) = result {
        if let Some(status) = &result.status {
            published.insert(KEY_STATUS.into(), Value::from(status.as_str()));
        }
        if let Some(report) = &result.main_report {
            published.insert(KEY_MAIN_REPORT.into(), Value::from(report.as_str()));
        }
        let snapshot = if result.raw.is_null() {
            serde_yaml::to_value(result)?
        } else {
            serde_yaml::to_value(&result.raw)?
        };
        published.insert(KEY_FINAL_MESSAGE.into(), snapshot);
    }
    Ok(())
}

/// Publishes job state into the project document and persists it
pub struct JobStateStore {
    store: Arc<dyn ProjectStore + Send + Sync>,
    export_template_id: String,
}

impl JobStateStore {
    /// Create a job state store over a project store
    ///
    /// # Arguments
    ///
    /// * `store` - Project document storage
    /// * `export_template_id` - Template entry receiving job state
    pub fn new_with_store(
        store: Arc<dyn ProjectStore + Send + Sync>,
        export_template_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            export_template_id: export_template_id.into(),
        }
    }

    /// Template entry receiving job state
    pub fn export_template_id(&self) -> &str {
        &self.export_template_id
    }

    /// Load the project document
    pub fn load(&self) -> Result<ProjectState> {
        self.store.load()
    }

    /// Write the job id (and result, when known) and persist the document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or saved.
    pub fn publish(
        &self,
        state: &mut ProjectState,
        job_id: &JobId,
        result: Option<&JobResult>,
    ) -> Result<()> {
        record_job(state, &self.export_template_id, job_id, result)?;
        self.store.save(state)?;

        tracing::info!(
            job_id = %job_id,
            template_id = %self.export_template_id,
            with_result = result.is_some(),
            location = %self.store.location(),
            "Published export job state"
        );
        Ok(())
    }

    /// Job id of an earlier submission, if one was published
    pub fn existing_job_id(&self, state: &ProjectState) -> Option<JobId> {
        state
            .template(&self.export_template_id)
            .and_then(|entry| entry.published_str(KEY_JOB_ID))
            .and_then(|id| JobId::new(id).ok())
    }

    /// Publish a host-qualified output of any template and persist
    pub fn publish_output(
        &self,
        state: &mut ProjectState,
        template_id: &str,
        key: &str,
        value: &HostPath,
    ) -> Result<()> {
        state
            .template_entry(template_id)
            .published
            .insert(key.into(), Value::from(value.to_string()));
        self.store.save(state)?;

        tracing::info!(template_id, key, value = %value, "Published template output");
        Ok(())
    }
}
