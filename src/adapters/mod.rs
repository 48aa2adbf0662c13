//! External system integrations for Courier.
//!
//! - [`export_api`] - Export engine integration (submit, poll, status, delete)
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the core logic
//! can be exercised with scripted implementations. The export engine is
//! reached through [`export_api::ExportApi`]:
//!
//! ```rust,no_run
//! use courier::adapters::export_api::{ExportClient, HttpExportApi, PollPolicy};
//! use courier::config::ExportApiConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportApiConfig {
//!     base_url: "http://export.example.org:9500".to_string(),
//!     ..Default::default()
//! };
//!
//! let api = HttpExportApi::new(&config.base_url, &config)?;
//! let client = ExportClient::new(Arc::new(api)).with_policy(PollPolicy::from(&config));
//! # Ok(())
//! # }
//! ```

pub mod export_api;
