//! Aggregator stage: per-word post frequency and cumulative sentiment

use super::post::Post;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Aggregate over the filtered corpus for one canonical word
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordStat {
    pub word: String,
    /// Number of distinct posts containing the word
    pub count: u64,
    /// Sum of the scores of those posts
    pub total_score: f64,
}

impl WordStat {
    pub fn new(word: String) -> Self {
        Self {
            word,
            count: 0,
            total_score: 0.0,
        }
    }

    /// `None` until the word has been seen at least once
    pub fn average_score(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total_score / self.count as f64)
        }
    }
}

/// Word statistics in first-appearance order.
///
/// The order is post order, then token order inside a post. The selector
/// relies on it to break ties reproducibly.
#[derive(Debug, Clone, Default)]
pub struct WordStats {
    stats: Vec<WordStat>,
    index: HashMap<String, usize>,
    num_posts: usize,
}

impl WordStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one post. Repeated words count once per post.
    pub fn add_post(&mut self, post: &Post) {
        self.num_posts += 1;
        if post.words.is_empty() {
            return;
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(post.words.len());
        for word in &post.words {
            if !seen.insert(word.as_str()) {
                continue;
            }

            let idx = match self.index.get(word.as_str()) {
                Some(&idx) => idx,
                None => {
                    self.stats.push(WordStat::new(word.clone()));
                    self.index.insert(word.clone(), self.stats.len() - 1);
                    self.stats.len() - 1
                }
            };

            let stat = &mut self.stats[idx];
            stat.count += 1;
            stat.total_score += post.score;
        }
    }

    pub fn get(&self, word: &str) -> Option<&WordStat> {
        self.index.get(word).map(|&idx| &self.stats[idx])
    }

    /// Every word, in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = &WordStat> {
        self.stats.iter()
    }

    /// Number of posts fed in, including posts without words
    pub fn num_posts(&self) -> usize {
        self.num_posts
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

pub struct WordAggregator;

impl WordAggregator {
    /// Single pass over the filtered posts
    pub fn aggregate(posts: &[Post]) -> WordStats {
        let mut stats = WordStats::new();
        for post in posts {
            stats.add_post(post);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_post(words: &[&str], score: f64) -> Post {
        Post::new(
            words.iter().map(|w| w.to_string()).collect(),
            Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(),
            score,
        )
    }

    #[test]
    fn test_repeated_word_counts_once_per_post() {
        let posts = vec![
            create_test_post(&["moon", "moon", "moon", "rocket"], 2.0),
            create_test_post(&["moon"], -1.0),
        ];

        let stats = WordAggregator::aggregate(&posts);

        let moon = stats.get("moon").unwrap();
        assert_eq!(moon.count, 2);
        assert_eq!(moon.total_score, 1.0);
        assert_eq!(moon.average_score(), Some(0.5));
        assert_eq!(stats.get("rocket").unwrap().count, 1);
    }

    #[test]
    fn test_empty_posts_counted_but_contribute_nothing() {
        let posts = vec![create_test_post(&[], 5.0), create_test_post(&["dip"], -0.5)];

        let stats = WordAggregator::aggregate(&posts);

        assert_eq!(stats.num_posts(), 2);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get("dip").unwrap().total_score, -0.5);
    }

    #[test]
    fn test_first_appearance_order() {
        let posts = vec![
            create_test_post(&["b", "a"], 1.0),
            create_test_post(&["c", "a", "d"], 1.0),
        ];

        let stats = WordAggregator::aggregate(&posts);
        let order: Vec<&str> = stats.iter().map(|s| s.word.as_str()).collect();

        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_average_undefined_without_posts() {
        assert_eq!(WordStat::new("x".to_string()).average_score(), None);
    }
}
