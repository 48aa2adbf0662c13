//! Export job documents
//!
//! [`spec`] assembles the job posted to the export engine, [`result`] models
//! what comes back.

pub mod result;
pub mod spec;

pub use result::{JobResult, JobState};
pub use spec::{BackendList, ExportEntry, ExportJobSpec, JobParams, JobSpecBuilder, ReportLink};
