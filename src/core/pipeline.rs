//! Export pipeline - orchestrates one export run for a project
//!
//! This module ties the pieces together: load the project document and the
//! mapping table, resolve the export list, build the job spec, submit it,
//! publish the job id, poll for the final message and publish the result.

use crate::adapters::export_api::{ExportApi, ExportClient, HttpExportApi, PollPolicy};
use crate::config::{secret_string_opt, CourierConfig};
use crate::core::job::{BackendList, ExportJobSpec, JobParams, JobResult, JobSpecBuilder, JobState};
use crate::core::mapping::resolver::{MappingResolver, ResolveContext};
use crate::core::mapping::MappingTable;
use crate::core::state::{JobStateStore, ProjectStore, YamlProjectStore};
use crate::domain::{current_hostname, CourierError, JobId, ProjectState, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the persisted job spec
pub const SPEC_FILE: &str = "export_job_spec.json";
/// File name of the persisted submission response
pub const RESPONSE_FILE: &str = "export_response.json";
/// File name of the persisted final message
pub const FINAL_MESSAGE_FILE: &str = "export_final_message.json";

/// Export-template parameters that override configuration defaults
pub const PARAM_API_URL: &str = "export_engine_api_url";
pub const PARAM_BACKENDS: &str = "export_engine_backends";
pub const PARAM_USERNAME: &str = "export_username";
pub const PARAM_PASSWORD: &str = "export_password";
pub const PARAM_EXPIRY_DAYS: &str = "export_expiry_days";

/// Per-run switches, usually from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build the spec but never contact the export engine
    pub dry_run: bool,
    /// Skip the final-message poll after submission
    pub skip_poll: bool,
    /// Export engine URL taking precedence over project and config
    pub api_url: Option<String>,
}

/// A resolved, not yet submitted export job
#[derive(Debug, Clone)]
pub struct BuiltJob {
    /// Project document the job was built from
    pub state: ProjectState,
    /// The job spec
    pub spec: ExportJobSpec,
    /// Where the spec was written, if it was
    pub spec_path: Option<PathBuf>,
}

/// Result of an export run
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub project_name: String,
    /// Number of resolved export entries
    pub entries: usize,
    pub spec_path: Option<PathBuf>,
    /// State the job ended in
    pub state: JobState,
    pub job_id: Option<JobId>,
    pub result: Option<JobResult>,
    /// Why polling failed, if it did
    pub poll_failure: Option<String>,
}

impl ExportReport {
    /// Process exit code for this outcome
    ///
    /// `0` when the job was built (dry run), submitted without polling, or
    /// finished with a final message; `1` when it was submitted but the final
    /// message is unknown.
    pub fn exit_code(&self) -> i32 {
        match self.state {
            JobState::Failed => 1,
            _ => 0,
        }
    }
}

/// Runs the export workflow against one project
pub struct ExportPipeline {
    config: CourierConfig,
    jobs: JobStateStore,
    current_host: String,
}

impl ExportPipeline {
    /// Create a pipeline over the project document named by the config
    pub fn new(config: CourierConfig) -> Self {
        let store = Arc::new(YamlProjectStore::new(config.project.state_path()));
        Self::new_with_store(config, store)
    }

    /// Create a pipeline over an explicit project store
    pub fn new_with_store(config: CourierConfig, store: Arc<dyn ProjectStore + Send + Sync>) -> Self {
        let jobs = JobStateStore::new_with_store(store, config.project.export_template_id.clone());
        Self {
            config,
            jobs,
            current_host: current_hostname(),
        }
    }

    /// Override the name of the host the pipeline runs on
    pub fn with_current_host(mut self, host: impl Into<String>) -> Self {
        self.current_host = host.into();
        self
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Job state store of the project
    pub fn jobs(&self) -> &JobStateStore {
        &self.jobs
    }

    /// Directory receiving the spec and API responses
    pub fn output_dir(&self) -> PathBuf {
        self.config.project.output_dir()
    }

    /// Resolve the mapping table and build the job spec
    ///
    /// Writes `export_job_spec.json` when `export.write_spec` is set. No
    /// network access.
    ///
    /// # Errors
    ///
    /// Returns an error if the project document or the mapping table cannot
    /// be loaded or are malformed.
    pub fn build(&self) -> Result<BuiltJob> {
        let state = self.jobs.load()?;
        state.validate()?;

        let table = MappingTable::from_yaml_file(&self.config.mapping.table_path)?;
        tracing::info!(
            project = %state.name,
            rules = table.len(),
            table = %self.config.mapping.table_path.display(),
            "Resolving export mapping"
        );

        let used = self
            .config
            .project
            .filter_used_templates
            .then(|| state.used_template_ids());

        let resolver = MappingResolver::new(self.resolve_context(&state));
        let entries = resolver.resolve(&table.mappings, &state, used.as_ref())?;

        let params = self.job_params(&state);
        let spec = JobSpecBuilder::build(entries, &state, params);
        tracing::info!(
            project = %spec.project_name,
            entries = spec.export_list.len(),
            backends = ?spec.backend.as_slice(),
            "Built export job spec"
        );

        let spec_path = if self.config.export.write_spec {
            let path = self.output_dir().join(SPEC_FILE);
            spec.write_json(&path)?;
            Some(path)
        } else {
            None
        };

        Ok(BuiltJob {
            state,
            spec,
            spec_path,
        })
    }

    /// Build, then submit and poll unless this is a dry run
    ///
    /// # Errors
    ///
    /// Build errors and submission errors are returned; nothing is published
    /// when submission fails. Polling failures are reported in the
    /// [`ExportReport`].
    pub async fn run(&self, options: &RunOptions) -> Result<ExportReport> {
        let built = self.build()?;

        if options.dry_run || self.config.application.dry_run {
            tracing::info!(project = %built.spec.project_name, "Dry run, not submitting");
            return Ok(ExportReport {
                project_name: built.spec.project_name.clone(),
                entries: built.spec.export_list.len(),
                spec_path: built.spec_path,
                state: JobState::Built,
                job_id: None,
                result: None,
                poll_failure: None,
            });
        }

        let api = self.http_api(&built.state, options.api_url.as_deref())?;
        self.submit(built, api, !options.skip_poll).await
    }

    /// Resolver context of the project on this host
    pub fn resolve_context(&self, state: &ProjectState) -> ResolveContext {
        ResolveContext::for_project(&self.config.project.dir, state, &self.current_host)
    }

    /// Export client for the project, using [`ExportPipeline::api_url`]
    pub fn client(&self, state: &ProjectState, explicit_url: Option<&str>) -> Result<ExportClient> {
        let api = self.http_api(state, explicit_url)?;
        Ok(ExportClient::new(api).with_policy(PollPolicy::from(&self.config.export_api)))
    }

    fn http_api(&self, state: &ProjectState, explicit_url: Option<&str>) -> Result<Arc<dyn ExportApi>> {
        let api_url = self.api_url(state, explicit_url)?;
        tracing::debug!(api_url = %api_url, "Using export engine");
        Ok(Arc::new(HttpExportApi::new(&api_url, &self.config.export_api)?))
    }

    /// Submit a built job over `api`, publish the job id, then poll
    pub async fn submit(
        &self,
        built: BuiltJob,
        api: Arc<dyn ExportApi>,
        poll: bool,
    ) -> Result<ExportReport> {
        let BuiltJob {
            mut state,
            spec,
            spec_path,
        } = built;
        let client = ExportClient::new(api).with_policy(PollPolicy::from(&self.config.export_api));

        let submitted = client.submit(&spec).await?;
        self.jobs.publish(&mut state, &submitted.job_id, None)?;
        self.write_snapshot(RESPONSE_FILE, &submitted.response);

        let mut report = ExportReport {
            project_name: spec.project_name.clone(),
            entries: spec.export_list.len(),
            spec_path,
            state: JobState::Submitted(submitted.job_id.clone()),
            job_id: Some(submitted.job_id.clone()),
            result: None,
            poll_failure: None,
        };

        if !poll {
            return Ok(report);
        }

        let outcome = client.poll_final_message(&submitted.job_id).await;
        if let Some(result) = &outcome.result {
            self.jobs.publish(&mut state, &submitted.job_id, Some(result))?;
            self.write_snapshot(FINAL_MESSAGE_FILE, &result.raw);
        }

        report.state = outcome.state;
        report.result = outcome.result;
        report.poll_failure = outcome.failure;
        Ok(report)
    }

    /// Export engine URL: explicit override, then the export template's
    /// `export_engine_api_url`, then `export_api.base_url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when none of them is set.
    pub fn api_url(&self, state: &ProjectState, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.export_param_str(state, PARAM_API_URL))
            .or_else(|| Some(self.config.export_api.base_url.trim()).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                CourierError::Configuration(
                    "no export API URL: pass --api-url, set export_api.base_url, or set \
                     export_engine_api_url on the export template"
                        .to_string(),
                )
            })
    }

    /// Job parameters from the config, overridden by export template params
    pub fn job_params(&self, state: &ProjectState) -> JobParams {
        let export = &self.config.export;
        let entry = state.template(self.jobs.export_template_id());

        let backends = entry
            .and_then(|e| e.param(PARAM_BACKENDS))
            .map(BackendList::from_value)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| BackendList::new(&export.backends));

        let username = self
            .export_param_str(state, PARAM_USERNAME)
            .map(str::to_string)
            .or_else(|| export.username.clone());

        let password = secret_string_opt(
            self.export_param_str(state, PARAM_PASSWORD)
                .map(str::to_string),
        )
        .or_else(|| export.password.clone());

        let expiry_days = entry
            .and_then(|e| e.param(PARAM_EXPIRY_DAYS))
            .and_then(parse_days)
            .unwrap_or(export.expiry_days);

        JobParams {
            username,
            password,
            backends,
            expiry_days,
            job_id: self.jobs.existing_job_id(state),
        }
    }

    fn export_param_str<'a>(&self, state: &'a ProjectState, key: &str) -> Option<&'a str> {
        state
            .template(self.jobs.export_template_id())
            .and_then(|e| e.param_str(key))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    // API responses are kept for inspection only; the job is already accepted.
    fn write_snapshot(&self, file_name: &str, body: &serde_json::Value) {
        if !self.config.export.write_spec {
            return;
        }
        let path = self.output_dir().join(file_name);
        if let Err(e) = write_json_file(&path, body) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to write export API response"
            );
        }
    }
}

fn parse_days(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Write a JSON document, creating parent directories
pub fn write_json_file(path: &Path, body: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(body)?)?;
    tracing::debug!(path = %path.display(), "Wrote JSON document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::Result as CourierResult;
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const TABLE: &str = r#"
mappings:
  - template_id: rnaseq
    src: "{template_root}/results"
    dest: "analysis/rnaseq"
    mode: symlink
    rule: tree
    include_in_report: true
    report_section: Analysis
  - template_id: unused
    src: "{template_root}"
    dest: "analysis/unused"
"#;

    const PROJECT: &str = r#"
name: 250901_Smith_UKA
authors:
  - name: Ada
    affiliation: UKA
templates:
  - id: rnaseq
  - id: export
    params:
      export_engine_backends: "apache, sftp"
      export_expiry_days: "14"
      export_password: pw-from-project
"#;

    struct Fixture {
        _dir: TempDir,
        config: CourierConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("P1");
        fs::create_dir_all(root.join("rnaseq/results")).unwrap();
        fs::write(root.join("project.yaml"), PROJECT).unwrap();
        fs::write(dir.path().join("table.yaml"), TABLE).unwrap();

        let mut config = CourierConfig::default();
        config.project.dir = root;
        config.mapping.table_path = dir.path().join("table.yaml");
        config.export_api.poll_backoff_seconds = 0;
        Fixture { _dir: dir, config }
    }

    struct FixedApi {
        submit: Mutex<Option<CourierResult<serde_json::Value>>>,
        final_message: Mutex<Option<CourierResult<serde_json::Value>>>,
    }

    impl FixedApi {
        fn new(
            submit: CourierResult<serde_json::Value>,
            final_message: CourierResult<serde_json::Value>,
        ) -> Arc<Self> {
            Arc::new(Self {
                submit: Mutex::new(Some(submit)),
                final_message: Mutex::new(Some(final_message)),
            })
        }
    }

    #[async_trait]
    impl ExportApi for FixedApi {
        async fn submit(&self, _spec: &ExportJobSpec) -> CourierResult<serde_json::Value> {
            self.submit.lock().unwrap().take().unwrap()
        }

        async fn final_message(&self, _job_id: &JobId) -> CourierResult<serde_json::Value> {
            self.final_message.lock().unwrap().take().unwrap()
        }

        async fn status(&self, _job_id: &JobId) -> CourierResult<serde_json::Value> {
            Ok(json!({}))
        }

        async fn delete_project(&self, _project_id: &str) -> CourierResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        fn base_url(&self) -> &str {
            "http://fixed"
        }
    }

    #[test]
    fn test_build_writes_spec_with_project_overrides() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config.clone()).with_current_host("nextgen");

        let built = pipeline.build().unwrap();
        assert_eq!(built.spec.export_list.len(), 1);
        assert_eq!(built.spec.export_list[0].dest, "analysis/rnaseq");
        assert_eq!(built.spec.backend.as_slice(), ["apache", "sftp"]);
        assert_eq!(built.spec.expiry_days, 14);
        assert_eq!(built.spec.username, "Smith");
        assert_eq!(
            built.spec.password.expose_secret().to_string(),
            "pw-from-project"
        );
        assert_eq!(built.spec.authors, vec!["Ada, UKA".to_string()]);

        let path = built.spec_path.unwrap();
        assert!(path.ends_with("export/export_job_spec.json"));
        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(ExportJobSpec::validate_document(&doc, false).is_ok());
    }

    #[test]
    fn test_config_defaults_when_project_has_no_overrides() {
        let mut f = fixture();
        fs::write(
            f.config.project.state_path(),
            "name: demo\ntemplates:\n  - id: rnaseq\n",
        )
        .unwrap();
        f.config.export.backends = vec!["owncloud".to_string()];
        f.config.export.expiry_days = 7;
        f.config.export.password = Some(secret_string("from-config".to_string()));

        let pipeline = ExportPipeline::new(f.config);
        let state = pipeline.jobs().load().unwrap();
        let params = pipeline.job_params(&state);
        assert_eq!(params.backends.as_slice(), ["owncloud"]);
        assert_eq!(params.expiry_days, 7);
        assert_eq!(
            params.password.unwrap().expose_secret().to_string(),
            "from-config"
        );
        assert!(params.job_id.is_none());
    }

    #[test]
    fn test_api_url_precedence() {
        let mut f = fixture();
        f.config.export_api.base_url = "http://config:9500".to_string();
        let pipeline = ExportPipeline::new(f.config.clone());
        let mut state = pipeline.jobs().load().unwrap();

        assert_eq!(
            pipeline.api_url(&state, Some("http://cli:1")).unwrap(),
            "http://cli:1"
        );
        assert_eq!(pipeline.api_url(&state, None).unwrap(), "http://config:9500");

        state
            .template_entry("export")
            .params
            .insert(PARAM_API_URL.into(), Value::from("http://project:2"));
        assert_eq!(pipeline.api_url(&state, None).unwrap(), "http://project:2");

        f.config.export_api.base_url = String::new();
        let bare = ExportPipeline::new(f.config);
        let state = bare.jobs().load().unwrap();
        assert!(matches!(
            bare.api_url(&state, None),
            Err(CourierError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_never_submits() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config);
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = pipeline.run(&options).await.unwrap();
        assert_eq!(report.state, JobState::Built);
        assert_eq!(report.exit_code(), 0);
        assert!(report.job_id.is_none());
    }

    #[tokio::test]
    async fn test_submit_publishes_job_and_result() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config.clone());
        let built = pipeline.build().unwrap();
        let api = FixedApi::new(
            Ok(json!({"job_id": "J1"})),
            Ok(json!({"job_id": "J1", "status": "success", "main_report": "https://x/r.html"})),
        );

        let report = pipeline.submit(built, api, true).await.unwrap();
        assert_eq!(report.state, JobState::Done);
        assert_eq!(report.exit_code(), 0);

        let state = pipeline.jobs().load().unwrap();
        let export = state.template("export").unwrap();
        assert_eq!(export.published_str("export_job_id"), Some("J1"));
        assert_eq!(export.published_str("export_status"), Some("success"));
        assert!(pipeline.output_dir().join(RESPONSE_FILE).exists());
        assert!(pipeline.output_dir().join(FINAL_MESSAGE_FILE).exists());
    }

    #[tokio::test]
    async fn test_failed_submit_publishes_nothing() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config.clone());
        let built = pipeline.build().unwrap();
        let api = FixedApi::new(
            Err(crate::domain::ExportApiError::HttpStatus {
                status: 500,
                body: "boom".to_string(),
            }
            .into()),
            Ok(json!({})),
        );

        assert!(pipeline.submit(built, api, true).await.is_err());
        let state = pipeline.jobs().load().unwrap();
        assert!(state
            .template("export")
            .and_then(|e| e.published_str("export_job_id"))
            .is_none());
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_job_id() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config.clone());
        let built = pipeline.build().unwrap();
        let api = FixedApi::new(
            Ok(json!({"job_id": "J2"})),
            Err(crate::domain::ExportApiError::Timeout("slow".to_string()).into()),
        );

        let report = pipeline.submit(built, api, true).await.unwrap();
        assert_eq!(report.state, JobState::Failed);
        assert_eq!(report.exit_code(), 1);
        assert!(report.poll_failure.is_some());

        let state = pipeline.jobs().load().unwrap();
        let export = state.template("export").unwrap();
        assert_eq!(export.published_str("export_job_id"), Some("J2"));
        assert!(export.published.get("export_final_message").is_none());
    }

    #[tokio::test]
    async fn test_unwritable_snapshots_do_not_lose_job() {
        let f = fixture();
        let pipeline = ExportPipeline::new(f.config.clone());
        let built = pipeline.build().unwrap();
        fs::create_dir_all(pipeline.output_dir().join(RESPONSE_FILE)).unwrap();
        fs::create_dir_all(pipeline.output_dir().join(FINAL_MESSAGE_FILE)).unwrap();
        let api = FixedApi::new(
            Ok(json!({"job_id": "J9"})),
            Ok(json!({"job_id": "J9", "status": "success"})),
        );

        let report = pipeline.submit(built, api, true).await.unwrap();
        assert_eq!(report.state, JobState::Done);
        assert_eq!(report.exit_code(), 0);

        let state = pipeline.jobs().load().unwrap();
        let export = state.template("export").unwrap();
        assert_eq!(export.published_str("export_job_id"), Some("J9"));
        assert_eq!(export.published_str("export_status"), Some("success"));
        assert!(pipeline.output_dir().join(RESPONSE_FILE).is_dir());
    }
}
