//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON-formatted file logs with rotation
//! - Configurable log levels (overridable through `RUST_LOG`)
//!
//! # Example
//!
//! ```no_run
//! use courier::logging::init_logging;
//! use courier::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Resolving export mapping");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a mapping rule that produced no export entry
///
/// # Example
///
/// ```no_run
/// use courier::log_rule_skipped;
///
/// log_rule_skipped!("bwa_align", "template not used by project");
/// log_rule_skipped!("bwa_align", "source missing", "/data/P1/bwa_align");
/// ```
#[macro_export]
macro_rules! log_rule_skipped {
    ($template_id:expr, $reason:expr) => {
        tracing::debug!(
            template_id = %$template_id,
            reason = $reason,
            "Skipping mapping rule"
        );
    };
    ($template_id:expr, $reason:expr, $detail:expr) => {
        tracing::warn!(
            template_id = %$template_id,
            reason = $reason,
            detail = %$detail,
            "Skipping mapping rule"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use courier::log_error_with_context;
/// use courier::domain::CourierError;
///
/// let error = CourierError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use courier::log_retry_attempt;
///
/// log_retry_attempt!(2, 4, "final message not ready");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = $reason,
            "Retrying operation"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::CourierError;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let err = CourierError::Other("boom".to_string());
        crate::log_rule_skipped!("bwa_align", "template not used by project");
        crate::log_rule_skipped!("bwa_align", "source missing", "/data/x");
        crate::log_error_with_context!(&err, "test");
        crate::log_retry_attempt!(1u32, 4u32, "final message not ready");
    }
}
