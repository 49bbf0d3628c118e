//! Word canonicalization, injected into the loader as a read-only dependency

use super::error::CommonWordsError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

/// Maps a cleaned token to its canonical display form.
///
/// Must be pure: the same input always yields the same output.
pub trait Canonicalize: Send + Sync {
    fn canonicalize<'a>(&self, word: &'a str) -> Cow<'a, str>;
}

/// Leaves every word untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapping;

impl Canonicalize for IdentityMapping {
    fn canonicalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(word)
    }
}

/// Lookup-table canonicalization. Unmapped words pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct WordMapping {
    table: HashMap<String, String>,
}

impl WordMapping {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a mapping from a JSON object file (`{"btc": "Bitcoin", ...}`)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CommonWordsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let table: HashMap<String, String> = serde_json::from_str(&json)?;
        log::info!("🔤 Loaded {} word mappings from {}", table.len(), path.display());
        Ok(Self { table })
    }

    /// Default table: ticker-chatter acronyms and brand spellings
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_MAPPING.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Canonicalize for WordMapping {
    fn canonicalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        match self.table.get(word) {
            Some(mapped) => Cow::Owned(mapped.clone()),
            None => Cow::Borrowed(word),
        }
    }
}

const BUILTIN_MAPPING: &[(&str, &str)] = &[
    ("ai", "AI"),
    ("ad", "Ads"),
    ("ads", "Ads"),
    ("app", "App"),
    ("aws", "AWS"),
    ("btc", "Bitcoin"),
    ("bitcoin", "Bitcoin"),
    ("ceo", "CEO"),
    ("cfo", "CFO"),
    ("djia", "Dow Jones"),
    ("dia", "Dow Jones"),
    ("dow", "Dow Jones"),
    ("eps", "EPS"),
    ("etf", "ETF"),
    ("eth", "Ethereum"),
    ("fb", "Facebook"),
    ("facebook", "Facebook"),
    ("fed", "Fed"),
    ("fda", "FDA"),
    ("gdp", "GDP"),
    ("gold", "Gold"),
    ("gld", "Gold"),
    ("ios", "iOS"),
    ("ipo", "IPO"),
    ("iphone", "iPhone"),
    ("ipad", "iPad"),
    ("mac", "Mac"),
    ("nasdaq", "Nasdaq"),
    ("nyse", "NYSE"),
    ("q1", "Q1"),
    ("q2", "Q2"),
    ("q3", "Q3"),
    ("q4", "Q4"),
    ("sec", "SEC"),
    ("silver", "Silver"),
    ("spx", "S&P 500"),
    ("spy", "S&P 500"),
    ("sp500", "S&P 500"),
    ("tesla", "Tesla"),
    ("trump", "Trump"),
    ("usd", "USD"),
    ("wsj", "WSJ"),
];
