//! Error types for the CommonWords engine

#[derive(Debug)]
pub enum CommonWordsError {
    /// No stored corpus exists for the requested ticker
    DataNotFound { ticker: String },
    Database(rusqlite::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidParameters(String),
}

impl From<rusqlite::Error> for CommonWordsError {
    fn from(err: rusqlite::Error) -> Self {
        CommonWordsError::Database(err)
    }
}

impl From<std::io::Error> for CommonWordsError {
    fn from(err: std::io::Error) -> Self {
        CommonWordsError::Io(err)
    }
}

impl From<serde_json::Error> for CommonWordsError {
    fn from(err: serde_json::Error) -> Self {
        CommonWordsError::Json(err)
    }
}

impl std::fmt::Display for CommonWordsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommonWordsError::DataNotFound { ticker } => {
                write!(f, "No post data found for ticker '{}'", ticker)
            }
            CommonWordsError::Database(e) => write!(f, "Database error: {}", e),
            CommonWordsError::Io(e) => write!(f, "IO error: {}", e),
            CommonWordsError::Json(e) => write!(f, "JSON error: {}", e),
            CommonWordsError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
        }
    }
}

impl std::error::Error for CommonWordsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommonWordsError::Database(e) => Some(e),
            CommonWordsError::Io(e) => Some(e),
            CommonWordsError::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// A post record that could not be turned into a [`Post`](super::post::Post).
///
/// Recoverable: the loader skips the record and keeps going.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Malformed record: {}", self.reason)
    }
}

impl std::error::Error for MalformedRecord {}
