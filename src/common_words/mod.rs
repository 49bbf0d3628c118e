//! CommonWords Engine - per-ticker word sentiment and co-occurrence analysis
//!
//! Given a ticker's posts, this module finds the words most associated with
//! positive and negative sentiment and how often those words appear together.
//!
//! # Architecture
//!
//! ```text
//! PostSource (JSONL / SQLite / in-memory) → PostLoader (date window + canonicalize)
//!     ↓
//! WordAggregator (count, total_score per word, once per post)
//!     ↓
//! WordSelector (min_count threshold, low/high extremes by metric)
//!     ↓
//! CooccurrenceMatrix (candidate pairs, serial or sharded with rayon)
//!     ↓
//! ReportWriter → JSON files or SQLite backend
//! ```

pub mod aggregator;
pub mod cooccurrence;
pub mod engine;
pub mod error;
pub mod jsonl_source;
pub mod loader;
pub mod mapping;
pub mod post;
pub mod selector;
pub mod source;
pub mod sqlite_source;
pub mod writer_backend;
pub mod json_writer;
pub mod sqlite_writer;
pub mod writer;

pub use aggregator::{WordAggregator, WordStat, WordStats};
pub use cooccurrence::{CooccurrenceGraph, CooccurrenceMatrix};
pub use engine::{CalculateParams, Calculation, CommonWordsEngine, CommonWordsReport};
pub use error::{CommonWordsError, MalformedRecord};
pub use jsonl_source::JsonlPostSource;
pub use loader::{DateWindow, LoadStats, PostLoader};
pub use mapping::{Canonicalize, IdentityMapping, WordMapping};
pub use post::{Post, PostRecord, ScoreField, WordsField};
pub use selector::{CandidateSet, FilterMetric, RankedWord, Selection, SelectorParams, WordSelector};
pub use source::{InMemoryPostSource, PostSource};
pub use sqlite_source::SqlitePostSource;
pub use writer_backend::{ReportWriterBackend, WriterError};
pub use json_writer::JsonReportWriter;
pub use sqlite_writer::SqliteReportWriter;
pub use writer::ReportWriter;
