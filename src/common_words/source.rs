//! Post source abstraction
//!
//! Storage format is pluggable; the engine only needs every record for a
//! ticker, in stored order.

use super::error::{CommonWordsError, MalformedRecord};
use super::post::PostRecord;
use std::collections::HashMap;

/// One fetched record. Records that could not even be decoded arrive as `Err`.
pub type RecordResult = Result<PostRecord, MalformedRecord>;

/// Tickers become file and directory names, so anything path-like is refused
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.trim().is_empty()
        && !ticker.starts_with('.')
        && !ticker.contains(|c: char| c == '/' || c == '\\' || c == ':' || c.is_control())
}

pub fn check_ticker(ticker: &str) -> Result<(), CommonWordsError> {
    if is_valid_ticker(ticker) {
        Ok(())
    } else {
        Err(CommonWordsError::InvalidParameters(format!("invalid ticker '{}'", ticker)))
    }
}

pub trait PostSource: Send {
    /// Fetch every stored record for `ticker`.
    ///
    /// Returns `DataNotFound` when the source has no corpus for the ticker.
    fn fetch(&self, ticker: &str) -> Result<Vec<RecordResult>, CommonWordsError>;

    /// Source type for logging
    fn source_type(&self) -> &'static str;
}

/// In-memory source, keyed by ticker
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostSource {
    records: HashMap<String, Vec<PostRecord>>,
}

impl InMemoryPostSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, records: Vec<PostRecord>) {
        self.records.entry(ticker.into()).or_default().extend(records);
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>, records: Vec<PostRecord>) -> Self {
        self.insert(ticker, records);
        self
    }
}

impl PostSource for InMemoryPostSource {
    fn fetch(&self, ticker: &str) -> Result<Vec<RecordResult>, CommonWordsError> {
        self.records
            .get(ticker)
            .map(|records| records.iter().cloned().map(Ok).collect())
            .ok_or_else(|| CommonWordsError::DataNotFound {
                ticker: ticker.to_string(),
            })
    }

    fn source_type(&self) -> &'static str {
        "memory"
    }
}
