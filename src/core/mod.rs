//! Core business logic for Courier.
//!
//! # Modules
//!
//! - [`mapping`] - Mapping table model and the export mapping resolver
//! - [`job`] - Export job spec, job result and job state
//! - [`state`] - Persistence of job state into the project document
//! - [`pipeline`] - Orchestration of a full export run
//!
//! # Export Workflow
//!
//! 1. **Load**: Read the project document and the mapping table
//! 2. **Resolve**: Turn mapping rules into export entries
//! 3. **Build**: Assemble the export job spec
//! 4. **Submit**: POST the spec to the export engine
//! 5. **Publish**: Record the job id on the export template
//! 6. **Poll**: Wait for the final message, retrying on HTTP 425
//! 7. **Publish**: Record status, main report and final message
//!
//! # Example
//!
//! ```rust,no_run
//! use courier::config::load_config;
//! use courier::core::pipeline::{ExportPipeline, RunOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("courier.toml")?;
//! let pipeline = ExportPipeline::new(config);
//!
//! let report = pipeline.run(&RunOptions::default()).await?;
//! println!("Entries: {}", report.entries);
//! println!("State: {}", report.state);
//! # Ok(())
//! # }
//! ```

pub mod job;
pub mod mapping;
pub mod pipeline;
pub mod state;
