//! Error types for Antelito
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Antelito operations
///
/// This enum encompasses all possible errors that can occur during
/// library management, catalog fetching, document ingestion, persistence,
/// and model streaming. None of these are process-fatal: every caller
/// either degrades gracefully or surfaces the error to the user.
#[derive(Error, Debug)]
pub enum AntelitoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote document catalog errors (unreachable, malformed)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Local library persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Per-file document ingestion errors (extraction, decoding)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Library import payload failed validation
    #[error("Import validation error: {0}")]
    ImportValidation(String),

    /// Model provider errors (request setup, streaming)
    #[error("Provider error: {0}")]
    Provider(String),

    /// An attachment could not be read or decoded
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// No chat session is currently bound
    #[error("No active chat session")]
    NoSession,

    /// A model request is already in flight on this session
    #[error("A request is already in flight")]
    RequestInFlight,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Antelito operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = AntelitoError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_catalog_error_display() {
        let error = AntelitoError::Catalog("HTTP 503".to_string());
        assert_eq!(error.to_string(), "Catalog error: HTTP 503");
    }

    #[test]
    fn test_storage_error_display() {
        let error = AntelitoError::Storage("db unavailable".to_string());
        assert_eq!(error.to_string(), "Storage error: db unavailable");
    }

    #[test]
    fn test_ingestion_error_display() {
        let error = AntelitoError::Ingestion("unreadable pdf".to_string());
        assert_eq!(error.to_string(), "Ingestion error: unreadable pdf");
    }

    #[test]
    fn test_import_validation_error_display() {
        let error = AntelitoError::ImportValidation("missing id".to_string());
        assert_eq!(error.to_string(), "Import validation error: missing id");
    }

    #[test]
    fn test_provider_error_display() {
        let error = AntelitoError::Provider("stream closed".to_string());
        assert_eq!(error.to_string(), "Provider error: stream closed");
    }

    #[test]
    fn test_no_session_error_display() {
        let error = AntelitoError::NoSession;
        assert_eq!(error.to_string(), "No active chat session");
    }

    #[test]
    fn test_request_in_flight_error_display() {
        let error = AntelitoError::RequestInFlight;
        assert_eq!(error.to_string(), "A request is already in flight");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: AntelitoError = io_error.into();
        assert!(matches!(error, AntelitoError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: AntelitoError = json_error.into();
        assert!(matches!(error, AntelitoError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: AntelitoError = yaml_error.into();
        assert!(matches!(error, AntelitoError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AntelitoError>();
    }
}
