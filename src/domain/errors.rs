//! Domain error types
//!
//! This module defines the error hierarchy for Courier.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Courier error type
///
/// This is the primary error type used throughout the application.
/// Configuration and mapping errors abort a run before any network call;
/// export API errors abort the submission step.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed mapping table or mapping rule
    #[error("Mapping table error: {0}")]
    Mapping(String),

    /// Malformed or inconsistent project state document
    #[error("Project state error: {0}")]
    Project(String),

    /// Export engine API errors
    #[error("Export API error: {0}")]
    ExportApi(#[from] ExportApiError),

    /// Job state persistence errors
    #[error("Job state error: {0}")]
    State(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Export engine API errors
///
/// Errors that occur when talking to the remote export engine.
/// These errors don't expose the HTTP client types.
#[derive(Debug, Error)]
pub enum ExportApiError {
    /// Failed to reach the export engine
    #[error("Failed to connect to export engine: {0}")]
    ConnectionFailed(String),

    /// Request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("Request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body could not be interpreted
    #[error("Invalid response from export engine: {0}")]
    InvalidResponse(String),

    /// Submission response lacked a usable job id
    #[error("Export API response missing job_id")]
    MissingJobId,

    /// Final message still not available after all attempts
    #[error("Final message not ready after {attempts} attempts")]
    NotReady { attempts: u32 },
}

impl ExportApiError {
    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ExportApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the export engine signalled "too early" (HTTP 425)
    pub fn is_too_early(&self) -> bool {
        self.status() == Some(425)
    }
}

impl From<std::io::Error> for CourierError {
    fn from(err: std::io::Error) -> Self {
        CourierError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CourierError {
    fn from(err: serde_yaml::Error) -> Self {
        CourierError::Serialization(format!("YAML error: {err}"))
    }
}

impl From<toml::de::Error> for CourierError {
    fn from(err: toml::de::Error) -> Self {
        CourierError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courier_error_display() {
        let err = CourierError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_export_api_error_conversion() {
        let api_err = ExportApiError::ConnectionFailed("refused".to_string());
        let err: CourierError = api_err.into();
        assert!(matches!(err, CourierError::ExportApi(_)));
    }

    #[test]
    fn test_missing_job_id_message() {
        let err = ExportApiError::MissingJobId;
        assert!(err.to_string().contains("missing job_id"));
    }

    #[test]
    fn test_too_early_detection() {
        let err = ExportApiError::HttpStatus {
            status: 425,
            body: String::new(),
        };
        assert!(err.is_too_early());

        let err = ExportApiError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(!err.is_too_early());
        assert_eq!(err.status(), Some(500));
        assert!(ExportApiError::Timeout("x".to_string()).status().is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: CourierError = io_err.into();
        assert!(matches!(err, CourierError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [b").unwrap_err();
        let err: CourierError = yaml_err.into();
        assert!(matches!(err, CourierError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: CourierError = toml_err.into();
        assert!(matches!(err, CourierError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
