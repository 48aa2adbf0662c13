//! Export engine endpoint layout

use crate::domain::JobId;

const EXPORT_SUFFIX: &str = "/export";

/// URLs of the export engine API
///
/// The configured base may be the bare server URL or already end in
/// `/export`; both normalize to the same endpoints.
///
/// # Example
///
/// ```
/// use courier::adapters::export_api::ExportEndpoints;
///
/// let a = ExportEndpoints::new("http://engine:9500/");
/// let b = ExportEndpoints::new("http://engine:9500/export");
/// assert_eq!(a, b);
/// assert_eq!(a.export(), "http://engine:9500/export");
/// assert_eq!(a.final_message("J1"), "http://engine:9500/export/final_message/J1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEndpoints {
    root: String,
}

impl ExportEndpoints {
    /// Normalize an API base URL
    pub fn new(api_base: &str) -> Self {
        let clean = api_base.trim().trim_end_matches('/');
        let root = if clean.ends_with(EXPORT_SUFFIX) {
            clean.to_string()
        } else {
            format!("{clean}{EXPORT_SUFFIX}")
        };
        Self { root }
    }

    /// Job submission endpoint
    pub fn export(&self) -> &str {
        &self.root
    }

    /// Final message of a job
    pub fn final_message(&self, job_id: impl AsRef<str>) -> String {
        format!("{}/final_message/{}", self.root, job_id.as_ref())
    }

    /// Current status of a job
    pub fn status(&self, job_id: impl AsRef<str>) -> String {
        format!("{}/status/{}", self.root, job_id.as_ref())
    }

    /// An exported project
    pub fn project(&self, project_id: &str) -> String {
        format!("{}/{}", self.root, project_id)
    }

    /// Final message endpoint for a typed job id
    pub fn final_message_for(&self, job_id: &JobId) -> String {
        self.final_message(job_id.as_str())
    }
}
