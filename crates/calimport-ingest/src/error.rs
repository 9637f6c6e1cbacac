//! Error types for calendar import runs.
//!
//! Only two kinds of failure ever leave the pipeline: a source that could not
//! be fetched, and a document the grammar parser failed on for a reason other
//! than the document being malformed. Malformed documents and missing venue
//! data degrade to empty or partial results instead.

use std::fmt;
use thiserror::Error;

/// The category of an import error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorCode {
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// The remote server answered with a 5xx status.
    ServerError,
    /// The calendar URL does not exist (404/410).
    NotFound,
    /// The remote server answered with something that is not a calendar.
    InvalidResponse,
    /// The grammar parser failed for a reason other than a malformed document.
    ParseFailed,
    /// Configuration error - unknown timezone, unusable URL, etc.
    ConfigurationError,
}

impl ImportErrorCode {
    /// Returns true if this error is transient and the import may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ServerError)
    }

    /// Returns true if this error came from fetching the source.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::ServerError | Self::NotFound | Self::InvalidResponse
        )
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::NotFound => "not_found",
            Self::InvalidResponse => "invalid_response",
            Self::ParseFailed => "parse_failed",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ImportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that aborted the import of one calendar source.
#[derive(Debug, Error)]
pub struct ImportError {
    /// The error code categorizing this error.
    code: ImportErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The source being imported (usually its URL).
    source_name: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ImportError {
    /// Creates a new import error with the given code and message.
    pub fn new(code: ImportErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            source: None,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::ServerError, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::NotFound, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::InvalidResponse, message)
    }

    /// Creates a fatal parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::ParseFailed, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ImportErrorCode::ConfigurationError, message)
    }

    /// Sets the name of the source being imported.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ImportErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source name, if set.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ImportErrorCode::NetworkError.is_retryable());
        assert!(ImportErrorCode::ServerError.is_retryable());
        assert!(!ImportErrorCode::NotFound.is_retryable());
        assert!(!ImportErrorCode::ParseFailed.is_retryable());
    }

    #[test]
    fn error_code_transport() {
        assert!(ImportErrorCode::NotFound.is_transport());
        assert!(ImportErrorCode::InvalidResponse.is_transport());
        assert!(!ImportErrorCode::ParseFailed.is_transport());
        assert!(!ImportErrorCode::ConfigurationError.is_transport());
    }

    #[test]
    fn import_error_creation() {
        let err = ImportError::parse("grammar parser crashed");
        assert_eq!(err.code(), ImportErrorCode::ParseFailed);
        assert_eq!(err.message(), "grammar parser crashed");
        assert!(err.source_name().is_none());
        assert!(!err.is_retryable());
    }

    #[test]
    fn import_error_display() {
        let err = ImportError::not_found("HTTP 404")
            .with_source_name("http://example.org/cal.ics");
        let display = format!("{}", err);
        assert!(display.contains("[http://example.org/cal.ics]"));
        assert!(display.contains("not_found"));
        assert!(display.contains("HTTP 404"));
    }

    #[test]
    fn import_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ImportError::network("fetch failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
