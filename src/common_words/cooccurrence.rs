//! Co-occurrence builder: pairwise post counts restricted to the candidate set
//!
//! Accumulation happens in a sparse matrix keyed by the ordered pair
//! `(min(w1, w2), max(w1, w2))`. Shards of the post sequence can be counted
//! independently and combined with [`CooccurrenceMatrix::merge`]; addition is
//! commutative and associative so shard completion order does not matter.

use super::post::Post;
use super::selector::CandidateSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooccurrenceMatrix {
    weights: HashMap<(String, String), u64>,
}

impl CooccurrenceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// Count every unordered pair of distinct candidate words in one post
    pub fn record_post(&mut self, words: &[String], candidates: &CandidateSet) {
        let filtered: BTreeSet<&str> = words
            .iter()
            .map(String::as_str)
            .filter(|w| candidates.contains(w))
            .collect();
        if filtered.len() < 2 {
            return;
        }

        let filtered: Vec<&str> = filtered.into_iter().collect();
        for (i, w1) in filtered.iter().enumerate() {
            for w2 in &filtered[i + 1..] {
                *self
                    .weights
                    .entry((w1.to_string(), w2.to_string()))
                    .or_insert(0) += 1;
            }
        }
    }

    /// Add another matrix's weights into this one
    pub fn merge(&mut self, other: CooccurrenceMatrix) {
        for (pair, weight) in other.weights {
            *self.weights.entry(pair).or_insert(0) += weight;
        }
    }

    pub fn weight(&self, a: &str, b: &str) -> u64 {
        if a == b {
            return 0;
        }
        self.weights.get(&Self::key(a, b)).copied().unwrap_or(0)
    }

    /// Number of pairs with a positive weight
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Serial pass over all posts
    pub fn build(posts: &[Post], candidates: &CandidateSet) -> Self {
        let mut matrix = Self::new();
        if candidates.len() < 2 {
            return matrix;
        }
        for post in posts {
            matrix.record_post(&post.words, candidates);
        }
        matrix
    }

    /// Fork-join pass: `workers` contiguous shards counted on the rayon pool, then merged
    pub fn build_parallel(posts: &[Post], candidates: &CandidateSet, workers: usize) -> Self {
        if workers <= 1 || posts.len() < 2 || candidates.len() < 2 {
            return Self::build(posts, candidates);
        }

        let shard_size = posts.len().div_ceil(workers);
        posts
            .par_chunks(shard_size)
            .map(|shard| Self::build(shard, candidates))
            .reduce(Self::new, |mut acc, shard| {
                acc.merge(shard);
                acc
            })
    }

    /// Symmetric adjacency over every candidate word
    pub fn into_graph(self, candidates: &CandidateSet) -> CooccurrenceGraph {
        let mut adjacency: BTreeMap<String, BTreeMap<String, u64>> = candidates
            .iter()
            .map(|word| (word.clone(), BTreeMap::new()))
            .collect();

        for ((w1, w2), weight) in self.weights {
            if weight == 0 || w1 == w2 {
                continue;
            }
            adjacency.entry(w1.clone()).or_default().insert(w2.clone(), weight);
            adjacency.entry(w2).or_default().insert(w1, weight);
        }

        CooccurrenceGraph { adjacency }
    }
}

/// Undirected weighted graph, serialized as `word -> {other_word: weight}`.
///
/// Both directions are present, keys are sorted, every candidate word is a
/// key (possibly with no neighbours), and zero weights never appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooccurrenceGraph {
    adjacency: BTreeMap<String, BTreeMap<String, u64>>,
}

impl CooccurrenceGraph {
    pub fn weight(&self, a: &str, b: &str) -> u64 {
        self.adjacency
            .get(a)
            .and_then(|neighbours| neighbours.get(b))
            .copied()
            .unwrap_or(0)
    }

    pub fn neighbours(&self, word: &str) -> Option<&BTreeMap<String, u64>> {
        self.adjacency.get(word)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.adjacency.keys()
    }

    /// Each undirected edge once, as `(a, b, weight)` with `a < b`
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.adjacency.iter().flat_map(|(a, neighbours)| {
            neighbours
                .iter()
                .filter(move |(b, _)| a.as_str() < b.as_str())
                .map(move |(b, weight)| (a.as_str(), b.as_str(), *weight))
        })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, u64>> {
        &self.adjacency
    }
}
