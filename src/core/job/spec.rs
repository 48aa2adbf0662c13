//! Export job specification
//!
//! The job spec is the JSON document posted to the export engine. It bundles
//! the resolved export list with the project's credentials, backends, authors
//! and expiry.

use crate::config::{secret_string, SecretString};
use crate::core::mapping::ExportMode;
use crate::domain::{CourierError, JobId, ProjectState, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Keys every persisted job spec must carry
pub const REQUIRED_SPEC_KEYS: [&str; 7] = [
    "project_name",
    "export_list",
    "backend",
    "username",
    "password",
    "authors",
    "expiry_days",
];

/// Bytes of entropy in a generated export password
const PASSWORD_BYTES: usize = 16;

/// A link from the export report into an exported entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLink {
    /// Path relative to the export root of the entry
    pub path: String,

    /// Report section
    pub section: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
}

/// One resolved export entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    /// Absolute source path on `host`
    pub src: String,

    /// Destination inside the export
    pub dest: String,

    /// Host the source lives on
    pub host: String,

    /// Project the entry belongs to
    pub project: String,

    /// Export mode
    pub mode: ExportMode,

    /// Whether the entry appears in the export report
    pub include_in_report: bool,

    /// Report section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_section: Option<String>,

    /// Entry description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Report links, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_links: Vec<ReportLink>,
}

/// Export backends, e.g. `apache`, `owncloud`, `sftp`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendList(Vec<String>);

impl BackendList {
    /// Build from individual names; blanks are dropped
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list
    ///
    /// ```
    /// use courier::core::job::BackendList;
    ///
    /// let backends = BackendList::from_csv(" apache, ,sftp ");
    /// assert_eq!(backends.as_slice(), ["apache", "sftp"]);
    /// ```
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    /// Parse a YAML parameter: a CSV string, a sequence, or a single scalar
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(s) => Self::from_csv(s),
            Value::Sequence(items) => Self::new(items.iter().filter_map(scalar_text)),
            other => Self::new(scalar_text(other)),
        }
    }

    /// Backend names
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether no backend is configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Caller-supplied job parameters
#[derive(Debug, Clone, Default)]
pub struct JobParams {
    /// Export username; derived from the project name when absent
    pub username: Option<String>,

    /// Export password; generated when absent
    pub password: Option<SecretString>,

    /// Backends to publish to
    pub backends: BackendList,

    /// Days until the export expires, 0 for never
    pub expiry_days: u32,

    /// Job id of a previous submission of this project
    pub job_id: Option<JobId>,
}

/// The export job document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJobSpec {
    /// Project name
    pub project_name: String,

    /// Resolved export entries in table order
    pub export_list: Vec<ExportEntry>,

    /// Backends to publish to
    pub backend: BackendList,

    /// Export username
    pub username: String,

    /// Export password
    pub password: SecretString,

    /// Formatted project authors
    pub authors: Vec<String>,

    /// Days until the export expires
    pub expiry_days: u32,

    /// Job id when resuming a previous job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl ExportJobSpec {
    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the spec as pretty JSON, creating parent directories
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        tracing::info!(
            path = %path.display(),
            entries = self.export_list.len(),
            "Wrote export job spec"
        );
        Ok(())
    }

    /// Check that a persisted spec document carries every required key
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Validation`] naming the missing keys, sorted.
    pub fn validate_document(doc: &serde_json::Value, require_job_id: bool) -> Result<()> {
        let obj = doc.as_object().ok_or_else(|| {
            CourierError::Validation("export job spec must be a JSON object".to_string())
        })?;

        let mut missing: Vec<&str> = REQUIRED_SPEC_KEYS
            .iter()
            .copied()
            .chain(require_job_id.then_some("job_id"))
            .filter(|key| !obj.contains_key(*key))
            .collect();
        missing.sort_unstable();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CourierError::Validation(format!(
                "export job spec missing keys: {missing:?}"
            )))
        }
    }
}

/// Assembles export entries and parameters into an [`ExportJobSpec`]
pub struct JobSpecBuilder;

impl JobSpecBuilder {
    /// Build the job spec
    ///
    /// The username falls back to the second `_`-delimited token of the
    /// project name, the password to a random URL-safe token. A job id is
    /// only carried over, never synthesized.
    pub fn build(
        export_list: Vec<ExportEntry>,
        project: &ProjectState,
        params: JobParams,
    ) -> ExportJobSpec {
        let username = params
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| derive_username(&project.name));

        let password = match params.password {
            Some(p) if !p.expose_secret().is_empty() => p,
            _ => {
                tracing::info!("No export password supplied, generating one");
                generate_password()
            }
        };

        ExportJobSpec {
            project_name: project.name.clone(),
            export_list,
            backend: params.backends,
            username,
            password,
            authors: project.formatted_authors(),
            expiry_days: params.expiry_days,
            job_id: params.job_id,
        }
    }
}

/// Username derived from a project name like `250901_Smith_UKA`
///
/// ```
/// use courier::core::job::spec::derive_username;
///
/// assert_eq!(derive_username("250901_Smith_UKA"), "Smith");
/// assert_eq!(derive_username("demo"), "demo");
/// assert_eq!(derive_username(""), "user");
/// ```
pub fn derive_username(project_name: &str) -> String {
    match project_name.split('_').nth(1) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ if !project_name.is_empty() => project_name.to_string(),
        _ => "user".to_string(),
    }
}

/// Random URL-safe password with 128 bits of entropy
pub fn generate_password() -> SecretString {
    let mut bytes = [0u8; PASSWORD_BYTES];
    OsRng.fill_bytes(&mut bytes);
    secret_string(URL_SAFE_NO_PAD.encode(bytes))
}

fn scalar_text(value: &Value) -> Option<String> {
    crate::domain::selector::stringify(value)
}
