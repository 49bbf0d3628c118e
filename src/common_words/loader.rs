//! Loader/Filter stage: restrict a ticker's corpus to a date window and
//! canonicalize every word exactly once

use super::error::CommonWordsError;
use super::mapping::Canonicalize;
use super::post::Post;
use super::source::PostSource;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Individually logged malformed records per load; the rest only count
const MAX_LOGGED_MALFORMED: usize = 5;

/// Inclusive `[start, end]` interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CommonWordsError> {
        if start > end {
            return Err(CommonWordsError::InvalidParameters(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub total_records: usize,
    pub malformed: usize,
    pub out_of_range: usize,
    pub retained: usize,
}

pub struct PostLoader<'a> {
    source: &'a dyn PostSource,
    canonicalizer: &'a dyn Canonicalize,
}

impl<'a> PostLoader<'a> {
    pub fn new(source: &'a dyn PostSource, canonicalizer: &'a dyn Canonicalize) -> Self {
        Self {
            source,
            canonicalizer,
        }
    }

    /// Load the posts for `ticker` whose timestamp falls inside `window`.
    ///
    /// Malformed records are skipped and counted. An unknown ticker fails
    /// with `DataNotFound`; zero posts in range is an empty `Vec`.
    pub fn load(
        &self,
        ticker: &str,
        window: &DateWindow,
    ) -> Result<(Vec<Post>, LoadStats), CommonWordsError> {
        let records = self.source.fetch(ticker)?;

        let mut stats = LoadStats {
            total_records: records.len(),
            ..LoadStats::default()
        };
        let mut posts = Vec::new();

        for record in records {
            let post = match record.and_then(|r| r.into_post()) {
                Ok(post) => post,
                Err(malformed) => {
                    stats.malformed += 1;
                    if stats.malformed <= MAX_LOGGED_MALFORMED {
                        log::warn!("⚠️  {}: skipping record: {}", ticker, malformed.reason);
                    }
                    continue;
                }
            };

            if !window.contains(&post.timestamp) {
                stats.out_of_range += 1;
                continue;
            }

            posts.push(self.canonicalize_post(post));
        }

        if stats.malformed > MAX_LOGGED_MALFORMED {
            log::warn!(
                "⚠️  {}: skipped {} malformed records in total",
                ticker,
                stats.malformed
            );
        }

        stats.retained = posts.len();
        log::debug!(
            "📥 {} ({}): {} records, {} malformed, {} out of range, {} retained",
            ticker,
            self.source.source_type(),
            stats.total_records,
            stats.malformed,
            stats.out_of_range,
            stats.retained
        );

        Ok((posts, stats))
    }

    fn canonicalize_post(&self, post: Post) -> Post {
        let words = post
            .words
            .iter()
            .map(|word| self.canonicalizer.canonicalize(word).into_owned())
            .collect();
        Post { words, ..post }
    }
}
