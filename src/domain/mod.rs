//! Domain models and types for Courier.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TemplateId`], [`JobId`])
//! - **Host-qualified paths** ([`HostPath`]) modelled as a `{host, path}` pair
//! - **Path selectors** ([`Selector`]) over nested project documents
//! - **The project state document** ([`ProjectState`], [`TemplateEntry`], [`Author`])
//! - **Error types** ([`CourierError`], [`ExportApiError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CourierError>`]:
//!
//! ```rust
//! use courier::domain::{CourierError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = courier::config::load_config("courier.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod host_path;
pub mod ids;
pub mod project;
pub mod result;
pub mod selector;

// Re-export commonly used types for convenience
pub use errors::{CourierError, ExportApiError};
pub use host_path::{current_hostname, HostPath};
pub use ids::{JobId, TemplateId, EXPORT_TEMPLATE_ID};
pub use project::{Author, ProjectState, TemplateEntry};
pub use result::Result;
pub use selector::Selector;
