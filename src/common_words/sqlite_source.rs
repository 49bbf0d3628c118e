//! SQLite post source
//!
//! Reads the `posts` table through a read-only connection. Rows come back in
//! `id` order so downstream tie-breaks stay reproducible.

use super::error::{CommonWordsError, MalformedRecord};
use super::post::{PostRecord, ScoreField, WordsField};
use super::source::{PostSource, RecordResult};
use crate::sqlite_pragma::apply_read_pragmas;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Schema expected by [`SqlitePostSource`]
pub const POSTS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker TEXT NOT NULL,
        words TEXT,
        created_at TEXT,
        score
    );
    CREATE INDEX IF NOT EXISTS idx_posts_ticker ON posts(ticker, id);
";

pub struct SqlitePostSource {
    conn: Connection,
    db_path: PathBuf,
}

impl SqlitePostSource {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, CommonWordsError> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(CommonWordsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("post database not found: {}", db_path.display()),
            )));
        }

        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        apply_read_pragmas(&conn)?;

        log::info!("📥 SQLite post source opened: {}", db_path.display());

        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn read_ticker(conn: &Connection, ticker: &str) -> Result<Vec<RecordResult>, CommonWordsError> {
        let mut stmt = conn.prepare(
            "SELECT words, created_at, score
             FROM posts
             WHERE ticker = ?1
             ORDER BY id ASC",
        )?;

        // Columns are loosely typed; a value that cannot be used is one bad record
        let rows = stmt.query_map([ticker], |row| {
            Ok(decode_row(row.get_ref(0)?, row.get_ref(1)?, row.get_ref(2)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }
}

fn decode_row(words: ValueRef<'_>, created_at: ValueRef<'_>, score: ValueRef<'_>) -> RecordResult {
    Ok(PostRecord {
        words: text_column(words, "words")?.map(WordsField::Text),
        created_at: text_column(created_at, "created_at")?,
        score: score_field(score)?,
    })
}

fn utf8(bytes: &[u8], column: &str) -> Result<String, MalformedRecord> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| MalformedRecord::new(format!("{} is not valid UTF-8", column)))
}

fn text_column(value: ValueRef<'_>, column: &str) -> Result<Option<String>, MalformedRecord> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => utf8(bytes, column).map(Some),
        ValueRef::Integer(i) => Ok(Some(i.to_string())),
        ValueRef::Real(f) => Ok(Some(f.to_string())),
        ValueRef::Blob(_) => Err(MalformedRecord::new(format!("{} stored as blob", column))),
    }
}

fn score_field(value: ValueRef<'_>) -> Result<Option<ScoreField>, MalformedRecord> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(ScoreField::Number(i as f64))),
        ValueRef::Real(f) => Ok(Some(ScoreField::Number(f))),
        ValueRef::Text(bytes) => utf8(bytes, "score").map(|s| Some(ScoreField::Text(s))),
        ValueRef::Blob(_) => Err(MalformedRecord::new("score stored as blob")),
    }
}

impl PostSource for SqlitePostSource {
    fn fetch(&self, ticker: &str) -> Result<Vec<RecordResult>, CommonWordsError> {
        let records = Self::read_ticker(&self.conn, ticker)?;
        if records.is_empty() {
            return Err(CommonWordsError::DataNotFound {
                ticker: ticker.to_string(),
            });
        }

        log::debug!("📥 Read {} rows for {} from {}", records.len(), ticker, self.db_path.display());
        Ok(records)
    }

    fn source_type(&self) -> &'static str {
        "SQLite"
    }
}
