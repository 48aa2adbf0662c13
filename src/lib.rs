// Courier - Export Mapping Resolver and Export Job Client
// Copyright (c) 2025 Courier Contributors
// Licensed under the MIT License

//! # Courier - export mapping resolver and export job client
//!
//! Courier turns the outputs recorded in a project's state document into an
//! export job for a remote export engine, submits it and waits for the
//! engine's final message.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Selecting** values out of nested project documents with a small path grammar
//! - **Resolving** host-qualified paths (`host:/abs/path`) against the project
//! - **Mapping** template outputs to export entries through an ordered rule table
//! - **Submitting** export jobs and polling for their final message with bounded retry
//! - **Publishing** the job id and final message back into the project document
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Mapping resolution, job specs, job state and the export pipeline
//! - [`adapters`] - The export engine HTTP API
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier::config::load_config;
//! use courier::core::pipeline::{ExportPipeline, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("courier.toml")?;
//!     let pipeline = ExportPipeline::new(config);
//!
//!     let report = pipeline.run(&RunOptions::default()).await?;
//!     if let Some(result) = &report.result {
//!         println!("{}", result.render_summary("export"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Resolving Without Submitting
//!
//! ```rust,no_run
//! use courier::core::mapping::{MappingResolver, MappingTable, ResolveContext};
//! use courier::domain::{current_hostname, ProjectState};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = Path::new("/data/projects/P1");
//! let state = ProjectState::from_yaml_str(&std::fs::read_to_string(dir.join("project.yaml"))?)?;
//! let table = MappingTable::from_yaml_file("export_mapping.table.yaml")?;
//!
//! let ctx = ResolveContext::for_project(dir, &state, &current_hostname());
//! let entries = MappingResolver::new(ctx).resolve(&table.mappings, &state, None)?;
//! for entry in &entries {
//!     println!("{}:{} -> {}", entry.host, entry.src, entry.dest);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All library operations return [`domain::Result`], carrying a
//! [`domain::CourierError`]. Export engine failures are wrapped as
//! [`domain::ExportApiError`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
