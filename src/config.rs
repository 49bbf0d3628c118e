//! Runner configuration from environment variables and CLI flags

use crate::common_words::loader::DateWindow;
use crate::common_words::post::parse_timestamp;
use crate::common_words::selector::{FilterMetric, SelectorParams};
use chrono::{DateTime, NaiveDate, Utc};
use std::env;
use std::path::PathBuf;

/// Tickers processed when `TICKERS` is not set
pub const DEFAULT_TICKERS: &[&str] = &[
    "TSLA", "AAPL", "AMZN", "GOOGL", "MSFT", "DIS", "META", "NKE", "NFLX", "INTC", "JPM", "PG",
    "T", "SBUX", "WMT", "PYPL", "BAC", "PFE", "V", "XOM", "JNJ", "AMD", "PEP", "MCD", "VZ", "KO",
    "BA", "MA", "MRK", "UNH", "HD", "CMCSA", "IBM", "COST", "CVX", "ORCL", "UPS", "CSCO", "KR",
    "F",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Jsonl,
    Sqlite,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the batch runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub source: SourceType,
    pub backend: BackendType,

    /// Directory of `<TICKER>.jsonl` files (JSONL source)
    pub data_dir: PathBuf,

    /// Post database (SQLite source)
    pub db_path: PathBuf,

    /// Output directory (JSON backend) or database file (SQLite backend)
    pub output_path: PathBuf,

    pub tickers: Vec<String>,
    pub window: DateWindow,
    pub selector: SelectorParams,
    pub cooccurrence_workers: usize,

    /// Optional JSON object file replacing the built-in word mapping
    pub word_mapping_path: Option<PathBuf>,

    /// Upper bound on tickers processed at the same time
    pub max_concurrent_tickers: usize,
}

impl RunnerConfig {
    /// Load configuration from the process environment and command line
    ///
    /// Environment variables:
    /// - `COMMON_WORDS_DATA_DIR` (default: data/posts)
    /// - `COMMON_WORDS_DB_PATH` (default: data/posts.db)
    /// - `COMMON_WORDS_OUTPUT_PATH` (default: output/common_words, or data/common_words.db for SQLite)
    /// - `TICKERS` (comma-separated, default: built-in list)
    /// - `START_DATE` / `END_DATE` (default: 2017-01-01 / 2019-12-31)
    /// - `MIN_COUNT_PERCENTAGE` (default: 0.01)
    /// - `TOP_N_WORDS` (default: 10)
    /// - `FILTER_METRIC` (default: average_score)
    /// - `COOCCURRENCE_WORKERS` (default: 1)
    /// - `WORD_MAPPING_PATH` (optional)
    /// - `MAX_CONCURRENT_TICKERS` (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().collect();
        Self::from_lookup(|key| env::var(key).ok(), &args)
    }

    /// Same as [`RunnerConfig::from_env`] with an explicit variable lookup
    pub fn from_lookup<F>(lookup: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = parse_source_from_args(args)?;
        let backend = parse_backend_from_args(args)?;

        let output_path = lookup("COMMON_WORDS_OUTPUT_PATH").unwrap_or_else(|| match backend {
            BackendType::Json => "output/common_words".to_string(),
            BackendType::Sqlite => "data/common_words.db".to_string(),
        });

        let tickers: Vec<String> = match lookup("TICKERS") {
            Some(list) => list
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
        };
        if tickers.is_empty() {
            return Err(ConfigError::InvalidValue("TICKERS is empty".to_string()));
        }

        let start = parse_date_bound(&lookup("START_DATE").unwrap_or_else(|| "2017-01-01".to_string()))?;
        let end = parse_date_bound(&lookup("END_DATE").unwrap_or_else(|| "2019-12-31".to_string()))?;
        let window = DateWindow::new(start, end)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let filter_metric = match lookup("FILTER_METRIC") {
            Some(raw) => FilterMetric::from_str(raw.trim()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "FILTER_METRIC must be average_score, total_score or count, got '{}'",
                    raw
                ))
            })?,
            None => FilterMetric::AverageScore,
        };

        let selector = SelectorParams {
            min_count_percentage: parse_var(&lookup, "MIN_COUNT_PERCENTAGE", 0.01)?,
            top_n_words: parse_var(&lookup, "TOP_N_WORDS", 10)?,
            filter_metric,
        };
        selector
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let cooccurrence_workers = match parse_parallel_from_args(args)? {
            Some(workers) => workers,
            None => parse_var(&lookup, "COOCCURRENCE_WORKERS", 1)?,
        };
        if cooccurrence_workers == 0 {
            return Err(ConfigError::InvalidValue(
                "co-occurrence workers must be at least 1".to_string(),
            ));
        }

        let max_concurrent_tickers: usize = parse_var(&lookup, "MAX_CONCURRENT_TICKERS", 4)?;
        if max_concurrent_tickers == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CONCURRENT_TICKERS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            source,
            backend,
            data_dir: lookup("COMMON_WORDS_DATA_DIR")
                .unwrap_or_else(|| "data/posts".to_string())
                .into(),
            db_path: lookup("COMMON_WORDS_DB_PATH")
                .unwrap_or_else(|| "data/posts.db".to_string())
                .into(),
            output_path: output_path.into(),
            tickers,
            window,
            selector,
            cooccurrence_workers,
            word_mapping_path: lookup("WORD_MAPPING_PATH").map(PathBuf::from),
            max_concurrent_tickers,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

pub fn parse_backend_from_args(args: &[String]) -> Result<BackendType, ConfigError> {
    match flag_value(args, "--backend") {
        None | Some("json") => Ok(BackendType::Json),
        Some("sqlite") => Ok(BackendType::Sqlite),
        Some(other) => Err(ConfigError::InvalidValue(format!(
            "--backend must be json or sqlite, got '{}'",
            other
        ))),
    }
}

pub fn parse_source_from_args(args: &[String]) -> Result<SourceType, ConfigError> {
    match flag_value(args, "--source") {
        None | Some("jsonl") => Ok(SourceType::Jsonl),
        Some("sqlite") => Ok(SourceType::Sqlite),
        Some(other) => Err(ConfigError::InvalidValue(format!(
            "--source must be jsonl or sqlite, got '{}'",
            other
        ))),
    }
}

fn parse_parallel_from_args(args: &[String]) -> Result<Option<usize>, ConfigError> {
    match flag_value(args, "--parallel") {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("--parallel expects a number, got '{}'", raw))),
    }
}

/// Parse a window bound: a full timestamp with offset, or a date (midnight UTC)
pub fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(ts) = parse_timestamp(raw) {
        return Ok(ts);
    }

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::InvalidValue(format!("invalid date '{}'", raw)))
}
