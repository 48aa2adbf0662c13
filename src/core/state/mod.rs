//! Project document persistence and job state publishing

pub mod store;

pub use store::{record_job, JobStateStore, ProjectStore, YamlProjectStore};
