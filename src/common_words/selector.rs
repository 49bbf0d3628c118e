//! Selector stage: support threshold plus top/bottom-N ranking

use super::aggregator::{WordStat, WordStats};
use super::error::CommonWordsError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMetric {
    #[default]
    AverageScore,
    TotalScore,
    Count,
}

impl FilterMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMetric::AverageScore => "average_score",
            FilterMetric::TotalScore => "total_score",
            FilterMetric::Count => "count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "average_score" => Some(FilterMetric::AverageScore),
            "total_score" => Some(FilterMetric::TotalScore),
            "count" | "counts" => Some(FilterMetric::Count),
            _ => None,
        }
    }

    pub fn all() -> [FilterMetric; 3] {
        [
            FilterMetric::AverageScore,
            FilterMetric::TotalScore,
            FilterMetric::Count,
        ]
    }

    /// Ascending order by this metric. Stats reaching the selector always have count >= 1.
    fn compare(&self, a: &WordStat, b: &WordStat) -> Ordering {
        match self {
            FilterMetric::Count => a.count.cmp(&b.count),
            FilterMetric::TotalScore => a.total_score.total_cmp(&b.total_score),
            FilterMetric::AverageScore => {
                let a = a.average_score().unwrap_or(0.0);
                let b = b.average_score().unwrap_or(0.0);
                a.total_cmp(&b)
            }
        }
    }
}

impl std::fmt::Display for FilterMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorParams {
    /// Fraction of filtered posts a word must appear in
    pub min_count_percentage: f64,
    pub top_n_words: usize,
    pub filter_metric: FilterMetric,
}

impl Default for SelectorParams {
    fn default() -> Self {
        Self {
            min_count_percentage: 0.01,
            top_n_words: 10,
            filter_metric: FilterMetric::AverageScore,
        }
    }
}

impl SelectorParams {
    pub fn validate(&self) -> Result<(), CommonWordsError> {
        if !self.min_count_percentage.is_finite()
            || !(0.0..=1.0).contains(&self.min_count_percentage)
        {
            return Err(CommonWordsError::InvalidParameters(format!(
                "min_count_percentage must be within [0, 1], got {}",
                self.min_count_percentage
            )));
        }
        Ok(())
    }

    /// `max(1, floor(num_posts * min_count_percentage))`
    pub fn min_count(&self, num_posts: usize) -> u64 {
        let raw = (num_posts as f64 * self.min_count_percentage).floor() as u64;
        raw.max(1)
    }
}

/// Output row for `high_words` / `low_words`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedWord {
    pub word: String,
    pub count: u64,
    pub total_score: f64,
    pub average_score: f64,
}

impl From<&WordStat> for RankedWord {
    fn from(stat: &WordStat) -> Self {
        Self {
            word: stat.word.clone(),
            count: stat.count,
            total_score: stat.total_score,
            average_score: stat.average_score().unwrap_or(0.0),
        }
    }
}

/// Words selected for graph construction: `high_words ∪ low_words`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    words: BTreeSet<String>,
}

impl CandidateSet {
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Sorted iteration
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.words.iter()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub min_count: u64,
    /// Words that passed the support threshold
    pub eligible: usize,
    /// Lowest-metric tail, ascending
    pub low_words: Vec<RankedWord>,
    /// Highest-metric tail excluding `low_words`, ascending
    pub high_words: Vec<RankedWord>,
    pub candidates: CandidateSet,
}

pub struct WordSelector {
    params: SelectorParams,
}

impl WordSelector {
    pub fn new(params: SelectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SelectorParams {
        &self.params
    }

    /// Rank words that pass the support threshold.
    ///
    /// Ties keep first-appearance order (stable sort, no secondary key).
    /// `high_words` never contains a word already placed in `low_words`.
    pub fn select(&self, stats: &WordStats) -> Selection {
        let min_count = self.params.min_count(stats.num_posts());
        let metric = self.params.filter_metric;
        let top_n = self.params.top_n_words;

        let mut eligible: Vec<&WordStat> = stats.iter().filter(|s| s.count >= min_count).collect();
        eligible.sort_by(|a, b| metric.compare(a, b));

        let low_end = top_n.min(eligible.len());
        let high_start = low_end.max(eligible.len().saturating_sub(top_n));

        let low_words: Vec<RankedWord> = eligible[..low_end].iter().map(|s| RankedWord::from(*s)).collect();
        let high_words: Vec<RankedWord> = eligible[high_start..].iter().map(|s| RankedWord::from(*s)).collect();

        let candidates = low_words
            .iter()
            .chain(high_words.iter())
            .map(|w| w.word.clone())
            .collect();

        log::debug!(
            "🎯 Selected {} low / {} high words by {} from {} eligible (min_count={})",
            low_words.len(),
            high_words.len(),
            metric,
            eligible.len(),
            min_count
        );

        Selection {
            min_count,
            eligible: eligible.len(),
            low_words,
            high_words,
            candidates,
        }
    }
}
