//! JSON writer: `high_words.json`, `low_words.json` and `adjacency_matrix.json`
//! under one directory per ticker

use super::engine::CommonWordsReport;
use super::source::is_valid_ticker;
use super::writer_backend::{ReportWriterBackend, WriterError};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const HIGH_WORDS_FILE: &str = "high_words.json";
pub const LOW_WORDS_FILE: &str = "low_words.json";
pub const ADJACENCY_FILE: &str = "adjacency_matrix.json";

pub struct JsonReportWriter {
    base_path: PathBuf,
}

impl JsonReportWriter {
    pub fn new(base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        log::info!("📝 Writing word reports to: {}", base_path.display());
        Ok(Self { base_path })
    }

    pub fn ticker_dir(&self, ticker: &str) -> PathBuf {
        self.base_path.join(ticker)
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WriterError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportWriterBackend for JsonReportWriter {
    fn write_report(&mut self, report: &CommonWordsReport) -> Result<(), WriterError> {
        if !is_valid_ticker(&report.ticker) {
            return Err(WriterError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write report for ticker '{}'", report.ticker),
            )));
        }

        let dir = self.ticker_dir(&report.ticker);
        fs::create_dir_all(&dir)?;

        Self::write_json(&dir.join(HIGH_WORDS_FILE), &report.high_words)?;
        Self::write_json(&dir.join(LOW_WORDS_FILE), &report.low_words)?;
        Self::write_json(&dir.join(ADJACENCY_FILE), &report.adjacency)?;

        log::debug!("📝 Saved outputs for {} to {}", report.ticker, dir.display());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSON"
    }
}
