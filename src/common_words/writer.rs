//! Unified report writer
//!
//! Routes writes to either the JSON or the SQLite backend based on configuration.

use super::engine::CommonWordsReport;
use super::json_writer::JsonReportWriter;
use super::sqlite_writer::SqliteReportWriter;
use super::writer_backend::{ReportWriterBackend, WriterError};
use crate::config::BackendType;
use std::path::PathBuf;

pub enum ReportWriter {
    Json(JsonReportWriter),
    Sqlite(SqliteReportWriter),
}

impl ReportWriter {
    /// `output_path` is a directory for JSON and a database file for SQLite
    pub fn new(backend: BackendType, output_path: PathBuf) -> Result<Self, WriterError> {
        match backend {
            BackendType::Json => Ok(ReportWriter::Json(JsonReportWriter::new(output_path)?)),
            BackendType::Sqlite => Ok(ReportWriter::Sqlite(SqliteReportWriter::new(output_path)?)),
        }
    }
}

impl ReportWriterBackend for ReportWriter {
    fn write_report(&mut self, report: &CommonWordsReport) -> Result<(), WriterError> {
        match self {
            ReportWriter::Json(w) => w.write_report(report),
            ReportWriter::Sqlite(w) => w.write_report(report),
        }
    }

    fn backend_type(&self) -> &'static str {
        match self {
            ReportWriter::Json(w) => w.backend_type(),
            ReportWriter::Sqlite(w) => w.backend_type(),
        }
    }
}
