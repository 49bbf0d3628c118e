//! CommonWords engine: Loader → Aggregator → Selector → Co-occurrence builder

use super::aggregator::WordAggregator;
use super::cooccurrence::{CooccurrenceGraph, CooccurrenceMatrix};
use super::error::CommonWordsError;
use super::loader::{DateWindow, PostLoader};
use super::mapping::Canonicalize;
use super::selector::{FilterMetric, RankedWord, SelectorParams, WordSelector};
use super::source::{check_ticker, PostSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Parameters of one `ticker × date-range` invocation
#[derive(Debug, Clone)]
pub struct CalculateParams {
    pub ticker: String,
    pub window: DateWindow,
    pub selector: SelectorParams,
    /// 1 runs the co-occurrence pass serially
    pub cooccurrence_workers: usize,
}

impl CalculateParams {
    pub fn new(ticker: impl Into<String>, window: DateWindow) -> Self {
        Self {
            ticker: ticker.into(),
            window,
            selector: SelectorParams::default(),
            cooccurrence_workers: 1,
        }
    }

    pub fn with_selector(mut self, selector: SelectorParams) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.cooccurrence_workers = workers;
        self
    }

    pub fn validate(&self) -> Result<(), CommonWordsError> {
        check_ticker(&self.ticker)?;
        if self.window.start > self.window.end {
            return Err(CommonWordsError::InvalidParameters(format!(
                "window start is after end ({})",
                self.window
            )));
        }
        if self.cooccurrence_workers == 0 {
            return Err(CommonWordsError::InvalidParameters(
                "cooccurrence_workers must be at least 1".to_string(),
            ));
        }
        self.selector.validate()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommonWordsReport {
    pub ticker: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub num_posts: usize,
    pub skipped_records: usize,
    pub min_count: u64,
    pub filter_metric: FilterMetric,
    pub high_words: Vec<RankedWord>,
    pub low_words: Vec<RankedWord>,
    pub adjacency: CooccurrenceGraph,
}

/// Outcome of a successful invocation
#[derive(Debug, Clone)]
pub enum Calculation {
    Report(CommonWordsReport),
    /// Valid ticker but no posts inside the window; nothing should be written
    EmptyRange { ticker: String, window: DateWindow },
}

impl Calculation {
    pub fn report(&self) -> Option<&CommonWordsReport> {
        match self {
            Calculation::Report(report) => Some(report),
            Calculation::EmptyRange { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<CommonWordsReport> {
        match self {
            Calculation::Report(report) => Some(report),
            Calculation::EmptyRange { .. } => None,
        }
    }

    pub fn is_empty_range(&self) -> bool {
        matches!(self, Calculation::EmptyRange { .. })
    }
}

pub struct CommonWordsEngine {
    source: Box<dyn PostSource>,
    canonicalizer: Arc<dyn Canonicalize>,
}

impl CommonWordsEngine {
    pub fn new(source: impl PostSource + 'static, canonicalizer: Arc<dyn Canonicalize>) -> Self {
        Self {
            source: Box::new(source),
            canonicalizer,
        }
    }

    pub fn calculate(&self, params: &CalculateParams) -> Result<Calculation, CommonWordsError> {
        params.validate()?;
        let ticker = params.ticker.as_str();

        let start = Instant::now();
        let loader = PostLoader::new(self.source.as_ref(), self.canonicalizer.as_ref());
        let (posts, load_stats) = loader.load(ticker, &params.window)?;
        log::debug!("⏱️  {}: load/filter took {:?}", ticker, start.elapsed());

        if posts.is_empty() {
            log::warn!("⚠️  No posts found for {} between {}", ticker, params.window);
            return Ok(Calculation::EmptyRange {
                ticker: ticker.to_string(),
                window: params.window,
            });
        }

        let pass_start = Instant::now();
        let stats = WordAggregator::aggregate(&posts);
        log::debug!(
            "⏱️  {}: first pass ({} posts, {} distinct words) took {:?}",
            ticker,
            posts.len(),
            stats.len(),
            pass_start.elapsed()
        );

        let selection = WordSelector::new(params.selector).select(&stats);

        let pass_start = Instant::now();
        let matrix = CooccurrenceMatrix::build_parallel(
            &posts,
            &selection.candidates,
            params.cooccurrence_workers,
        );
        let adjacency = matrix.into_graph(&selection.candidates);
        log::debug!(
            "⏱️  {}: second pass ({} candidates, {} edges, {} workers) took {:?}",
            ticker,
            selection.candidates.len(),
            adjacency.edge_count(),
            params.cooccurrence_workers,
            pass_start.elapsed()
        );

        log::info!(
            "✅ {}: {} posts, {} eligible words, {} candidates in {:?}",
            ticker,
            posts.len(),
            selection.eligible,
            selection.candidates.len(),
            start.elapsed()
        );

        Ok(Calculation::Report(CommonWordsReport {
            ticker: ticker.to_string(),
            start: params.window.start,
            end: params.window.end,
            num_posts: posts.len(),
            skipped_records: load_stats.malformed,
            min_count: selection.min_count,
            filter_metric: params.selector.filter_metric,
            high_words: selection.high_words,
            low_words: selection.low_words,
            adjacency,
        }))
    }
}
