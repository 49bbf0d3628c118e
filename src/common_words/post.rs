//! Post records as stored, and the validated `Post` the engine works on

use super::error::MalformedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layouts accepted besides RFC 3339. All of them carry an offset.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// One social-media message about one ticker, after validation.
///
/// `words` are already canonical once a post leaves the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub words: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

impl Post {
    pub fn new(words: Vec<String>, timestamp: DateTime<Utc>, score: f64) -> Self {
        Self {
            words,
            timestamp,
            score,
        }
    }
}

/// Token list as stored: either a JSON list or one whitespace-separated string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WordsField {
    List(Vec<String>),
    Text(String),
}

impl WordsField {
    pub fn into_words(self) -> Vec<String> {
        match self {
            WordsField::List(words) => words,
            WordsField::Text(text) => text.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Sentiment score as stored: a number, or a string that should hold one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreField {
    Number(f64),
    Text(String),
}

/// Raw post record as read from a source, not yet validated
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub words: Option<WordsField>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub score: Option<ScoreField>,
}

impl PostRecord {
    /// Parse a record from one JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, MalformedRecord> {
        serde_json::from_str(line).map_err(|e| MalformedRecord::new(format!("invalid JSON: {}", e)))
    }

    /// Validate timestamp and score. A missing word list is an empty post, not an error.
    pub fn into_post(self) -> Result<Post, MalformedRecord> {
        let created_at = self
            .created_at
            .ok_or_else(|| MalformedRecord::new("missing timestamp"))?;
        let timestamp = parse_timestamp(&created_at)?;

        let score = match self.score {
            Some(ScoreField::Number(value)) => value,
            Some(ScoreField::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| MalformedRecord::new(format!("unparseable score '{}'", text)))?,
            None => return Err(MalformedRecord::new("missing score")),
        };
        if !score.is_finite() {
            return Err(MalformedRecord::new(format!("non-finite score {}", score)));
        }

        let words = self.words.map(WordsField::into_words).unwrap_or_default();

        Ok(Post::new(words, timestamp, score))
    }
}

/// Parse a time-zone-aware timestamp and normalize it to UTC.
///
/// Naive timestamps (no offset) are rejected.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MalformedRecord> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    Err(MalformedRecord::new(format!("unparseable timestamp '{}'", raw)))
}
