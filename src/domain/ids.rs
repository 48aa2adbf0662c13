//! Domain identifier types with validation
//!
//! Newtype wrappers keep template ids and export job ids from being mixed up
//! with each other or with plain path strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Template id reserved for the export step itself.
///
/// Mapping rules naming this template are always skipped, and the export
/// job state is published under the project entry with this id.
pub const EXPORT_TEMPLATE_ID: &str = "export";

/// Template ID newtype wrapper
///
/// Identifies one template entry of a project (e.g. `rnaseq`, `demux_bclconvert`).
///
/// # Examples
///
/// ```
/// use courier::domain::ids::TemplateId;
/// use std::str::FromStr;
///
/// let template_id = TemplateId::from_str("nfcore_rnaseq").unwrap();
/// assert_eq!(template_id.as_str(), "nfcore_rnaseq");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(String);

impl TemplateId {
    /// Creates a new TemplateId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(TemplateId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Template ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the template ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for the reserved export template id
    pub fn is_export(&self) -> bool {
        self.0 == EXPORT_TEMPLATE_ID
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Export job identifier assigned by the export engine
///
/// Surrounding whitespace is stripped; an empty id is rejected.
///
/// # Examples
///
/// ```
/// use courier::domain::ids::JobId;
///
/// let job_id = JobId::new(" J1 ").unwrap();
/// assert_eq!(job_id.as_str(), "J1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
