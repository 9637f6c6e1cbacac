//! Client error types.

use std::fmt;

use calimport_ingest::ImportError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// The import itself failed.
    Import(ImportError),
    /// The existing-records seed file could not be used.
    Seed(String),
    /// The source cannot be imported by this build.
    UnsupportedSource(String),
    /// Output could not be rendered.
    Output(String),
    /// IO error.
    Io(std::io::Error),
}

impl ClientError {
    /// A follow-up suggestion printed under the error, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Import(err) if err.is_retryable() => {
                Some("the calendar server may be down, try again later")
            }
            Self::Import(err) if err.code().is_transport() => {
                Some("check that the calendar URL is reachable and serves iCalendar data")
            }
            Self::Config(_) => Some("run `calimport config validate` to check the settings"),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Import(err) => write!(f, "import failed: {}", err),
            Self::Seed(msg) => write!(f, "invalid seed file: {}", msg),
            Self::UnsupportedSource(msg) => write!(f, "unsupported source: {}", msg),
            Self::Output(msg) => write!(f, "output error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ImportError> for ClientError {
    fn from(err: ImportError) -> Self {
        Self::Import(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_failures_suggest_retrying() {
        let err = ClientError::from(ImportError::server("HTTP 503"));
        assert!(err.hint().unwrap().contains("try again"));
    }

    #[test]
    fn missing_feed_suggests_checking_url() {
        let err = ClientError::from(ImportError::not_found("HTTP 404"));
        assert!(err.hint().unwrap().contains("calendar URL"));
    }

    #[test]
    fn parse_failures_have_no_hint() {
        let err = ClientError::from(ImportError::parse("grammar crashed"));
        assert!(err.hint().is_none());
        assert!(err.to_string().starts_with("import failed:"));
    }

    #[test]
    fn config_errors_point_at_validate() {
        let err = ClientError::Config("unknown timezone".to_string());
        assert!(err.hint().unwrap().contains("config validate"));
    }
}
