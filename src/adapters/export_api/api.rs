//! Export engine transport trait
//!
//! [`ExportApi`] hides the wire transport from the submit/poll state
//! machine, so the same client logic runs over HTTP or a scripted fake.

use crate::core::job::ExportJobSpec;
use crate::domain::{JobId, Result};
use async_trait::async_trait;

/// Raw calls against the export engine
///
/// Implementations return the decoded JSON body on a 2xx response and
/// [`crate::domain::ExportApiError`] otherwise. An HTTP 425 must surface as
/// `ExportApiError::HttpStatus { status: 425, .. }` so callers can retry.
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// POST a job spec to the export endpoint
    async fn submit(&self, spec: &ExportJobSpec) -> Result<serde_json::Value>;

    /// GET the final message of a job
    async fn final_message(&self, job_id: &JobId) -> Result<serde_json::Value>;

    /// GET the current status of a job
    async fn status(&self, job_id: &JobId) -> Result<serde_json::Value>;

    /// DELETE an exported project; an empty body decodes to `null`
    async fn delete_project(&self, project_id: &str) -> Result<serde_json::Value>;

    /// Base URL of the export engine
    fn base_url(&self) -> &str;
}
