//! Export job results and lifecycle

use crate::domain::{ExportApiError, JobId};
use serde::{Deserialize, Serialize};
use std::fmt;

const RULE_WIDTH: usize = 60;

/// Lifecycle of one export job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Spec assembled, nothing sent
    Built,
    /// Submission in flight
    Submitting,
    /// Accepted by the export engine
    Submitted(JobId),
    /// Waiting for the final message
    Polling,
    /// Final message received
    Done,
    /// Submission or polling failed
    Failed,
}

impl JobState {
    /// Whether the job reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Built => write!(f, "built"),
            JobState::Submitting => write!(f, "submitting"),
            JobState::Submitted(id) => write!(f, "submitted({id})"),
            JobState::Polling => write!(f, "polling"),
            JobState::Done => write!(f, "done"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Final message of an export job
///
/// Every field is optional on the wire; `raw` keeps the complete response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_report: Option<String>,

    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl JobResult {
    /// Interpret a final-message response body
    ///
    /// Blank strings count as absent. `status` falls back to `type`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportApiError::InvalidResponse`] unless the body is a JSON object.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, ExportApiError> {
        let obj = raw.as_object().ok_or_else(|| {
            ExportApiError::InvalidResponse("final message is not a JSON object".to_string())
        })?;

        let text = |key: &str| {
            obj.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            job_id: text("job_id"),
            status: text("status").or_else(|| text("type")),
            formatted_message: text("formatted_message"),
            message: text("message"),
            main_report: text("main_report"),
            raw: raw.clone(),
        })
    }

    /// Render the human-readable final summary
    ///
    /// Only the fields present in the response are printed.
    pub fn render_summary(&self, label: &str) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        let mut lines = vec![heavy.clone(), format!("[{label}] Final Export Summary")];
        if let Some(status) = &self.status {
            lines.push(format!("Status: {status}"));
        }
        lines.push(light.clone());

        if let Some(formatted) = &self.formatted_message {
            lines.push(formatted.clone());
        }
        if let Some(plain) = &self.message {
            if self.formatted_message.is_some() {
                lines.push(String::new());
                lines.push(format!("[{label}] Raw message:"));
            }
            lines.push(plain.clone());
        }

        if self.job_id.is_some() || self.main_report.is_some() {
            lines.push(light);
            if let Some(job_id) = &self.job_id {
                lines.push(format!("job_id: {job_id}"));
            }
            if let Some(report) = &self.main_report {
                lines.push(format!("main_report: {report}"));
            }
        }
        lines.push(heavy);
        lines.join("\n")
    }
}
