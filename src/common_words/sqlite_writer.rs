//! SQLite writer for CommonWords reports
//!
//! Rankings go to `word_rankings`, graph edges to `word_cooccurrence` with one
//! row per undirected edge (`word_a < word_b`).

use super::engine::CommonWordsReport;
use super::selector::RankedWord;
use super::writer_backend::{ReportWriterBackend, WriterError};
use crate::sqlite_pragma::apply_write_pragmas;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

const REPORT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS word_rankings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker TEXT NOT NULL,
        window_start TEXT NOT NULL,
        window_end TEXT NOT NULL,
        filter_metric TEXT NOT NULL,
        side TEXT NOT NULL CHECK (side IN ('high', 'low')),
        rank INTEGER NOT NULL,
        word TEXT NOT NULL,
        count INTEGER NOT NULL,
        total_score REAL NOT NULL,
        average_score REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_word_rankings_ticker
        ON word_rankings(ticker, window_start, window_end);

    CREATE TABLE IF NOT EXISTS word_cooccurrence (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker TEXT NOT NULL,
        window_start TEXT NOT NULL,
        window_end TEXT NOT NULL,
        word_a TEXT NOT NULL,
        word_b TEXT NOT NULL,
        weight INTEGER NOT NULL CHECK (weight > 0),
        CHECK (word_a < word_b)
    );
    CREATE INDEX IF NOT EXISTS idx_word_cooccurrence_ticker
        ON word_cooccurrence(ticker, window_start, window_end);
";

pub struct SqliteReportWriter {
    conn: Connection,
}

impl SqliteReportWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, WriterError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        apply_write_pragmas(&conn)?;
        conn.execute_batch(REPORT_SCHEMA)?;

        log::info!("✅ SQLite report writer initialized: {}", db_path.display());

        Ok(Self { conn })
    }

    fn insert_rankings(
        tx: &Transaction<'_>,
        report: &CommonWordsReport,
        window: (&str, &str),
        side: &str,
        words: &[RankedWord],
    ) -> Result<(), WriterError> {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO word_rankings
                (ticker, window_start, window_end, filter_metric, side, rank,
                 word, count, total_score, average_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for (rank, word) in words.iter().enumerate() {
            stmt.execute(params![
                report.ticker,
                window.0,
                window.1,
                report.filter_metric.as_str(),
                side,
                rank as i64,
                word.word,
                word.count as i64,
                word.total_score,
                word.average_score,
            ])?;
        }
        Ok(())
    }
}

impl ReportWriterBackend for SqliteReportWriter {
    fn write_report(&mut self, report: &CommonWordsReport) -> Result<(), WriterError> {
        let start = report.start.to_rfc3339();
        let end = report.end.to_rfc3339();

        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM word_rankings WHERE ticker = ?1 AND window_start = ?2 AND window_end = ?3",
            params![report.ticker, start, end],
        )?;
        tx.execute(
            "DELETE FROM word_cooccurrence WHERE ticker = ?1 AND window_start = ?2 AND window_end = ?3",
            params![report.ticker, start, end],
        )?;

        Self::insert_rankings(&tx, report, (&start, &end), "low", &report.low_words)?;
        Self::insert_rankings(&tx, report, (&start, &end), "high", &report.high_words)?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO word_cooccurrence
                    (ticker, window_start, window_end, word_a, word_b, weight)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (word_a, word_b, weight) in report.adjacency.edges() {
                stmt.execute(params![report.ticker, start, end, word_a, word_b, weight as i64])?;
            }
        }

        tx.commit()?;

        log::debug!(
            "✅ Report written: {} ({} ranked words, {} edges)",
            report.ticker,
            report.low_words.len() + report.high_words.len(),
            report.adjacency.edge_count()
        );

        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}
