//! Writer backend trait for CommonWords reports
//!
//! Defines the interface for persisting a finished report to different backends.

use super::engine::CommonWordsReport;

#[derive(Debug)]
pub enum WriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(rusqlite::Error),
}

impl From<std::io::Error> for WriterError {
    fn from(err: std::io::Error) -> Self {
        WriterError::Io(err)
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        WriterError::Serialization(err)
    }
}

impl From<rusqlite::Error> for WriterError {
    fn from(err: rusqlite::Error) -> Self {
        WriterError::Database(err)
    }
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterError::Io(e) => write!(f, "IO error: {}", e),
            WriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
            WriterError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for WriterError {}

/// Backend trait for writing reports
pub trait ReportWriterBackend: Send {
    /// Persist one report, replacing any previous output for the same ticker and window
    fn write_report(&mut self, report: &CommonWordsReport) -> Result<(), WriterError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
