//! Export engine adapter
//!
//! This module provides the integration with the remote export engine,
//! including endpoint normalization, the transport trait, its HTTP
//! implementation and the submit/poll client.

pub mod api;
pub mod client;
pub mod endpoints;
pub mod http;

pub use api::ExportApi;
pub use client::{ExportClient, ExportRun, PollOutcome, PollPolicy, SubmittedJob};
pub use endpoints::ExportEndpoints;
pub use http::HttpExportApi;
