//! CommonWords Binary - per-ticker word sentiment and co-occurrence reports
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin common_words -- --source jsonl --backend json --parallel 4
//! ```
//!
//! ## Environment Variables
//!
//! - COMMON_WORDS_DATA_DIR - Directory of `<TICKER>.jsonl` files (default: data/posts)
//! - COMMON_WORDS_DB_PATH - Post database, used with --source sqlite (default: data/posts.db)
//! - COMMON_WORDS_OUTPUT_PATH - Output directory or database (default: output/common_words, data/common_words.db with --backend sqlite)
//! - TICKERS - Comma-separated tickers (default: built-in list)
//! - START_DATE / END_DATE - Inclusive window (default: 2017-01-01 / 2019-12-31)
//! - MIN_COUNT_PERCENTAGE - Minimum share of posts a word must appear in (default: 0.01)
//! - TOP_N_WORDS - Words kept at each extreme (default: 10)
//! - FILTER_METRIC - average_score, total_score or count (default: average_score)
//! - COOCCURRENCE_WORKERS - Co-occurrence shards, overridden by --parallel (default: 1)
//! - WORD_MAPPING_PATH - JSON object of word replacements (optional)
//! - MAX_CONCURRENT_TICKERS - Tickers processed at once (default: 4)
//! - RUST_LOG - Logging level (optional, default: info)

use commonwords::common_words::{
    CalculateParams, Calculation, Canonicalize, CommonWordsEngine, CommonWordsError,
    JsonlPostSource, ReportWriter, ReportWriterBackend, SqlitePostSource, WordMapping,
};
use commonwords::config::{RunnerConfig, SourceType};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

fn run_ticker(
    config: &RunnerConfig,
    ticker: &str,
    canonicalizer: Arc<dyn Canonicalize>,
) -> Result<Calculation, CommonWordsError> {
    let engine = match config.source {
        SourceType::Jsonl => {
            CommonWordsEngine::new(JsonlPostSource::new(config.data_dir.clone()), canonicalizer)
        }
        SourceType::Sqlite => {
            CommonWordsEngine::new(SqlitePostSource::open(&config.db_path)?, canonicalizer)
        }
    };

    let params = CalculateParams::new(ticker, config.window)
        .with_selector(config.selector)
        .with_workers(config.cooccurrence_workers);

    engine.calculate(&params)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Arc::new(RunnerConfig::from_env()?);

    log::info!("🚀 Starting CommonWords");
    log::info!("   Source: {:?}", config.source);
    log::info!("   Tickers: {}", config.tickers.len());
    log::info!("   Window: {}", config.window);
    log::info!(
        "   Min count: {}% of posts, top {} words by {}",
        config.selector.min_count_percentage * 100.0,
        config.selector.top_n_words,
        config.selector.filter_metric
    );
    log::info!("   Co-occurrence workers: {}", config.cooccurrence_workers);
    log::info!("   Concurrent tickers: {}", config.max_concurrent_tickers);

    let canonicalizer: Arc<dyn Canonicalize> = match &config.word_mapping_path {
        Some(path) => Arc::new(WordMapping::from_json_file(path)?),
        None => Arc::new(WordMapping::builtin()),
    };

    let mut writer = ReportWriter::new(config.backend, config.output_path.clone())?;
    log::info!("📊 Backend: {} ({})", writer.backend_type(), config.output_path.display());

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_tickers));
    let mut tasks = JoinSet::new();

    for ticker in config.tickers.iter().cloned() {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        let canonicalizer = canonicalizer.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = run_ticker(&config, &ticker, canonicalizer);
            (ticker, result)
        });
    }

    let mut written = 0;
    let mut empty = 0;
    let mut failed = 0;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((ticker, Ok(Calculation::Report(report)))) => match writer.write_report(&report) {
                Ok(()) => {
                    written += 1;
                    log::info!(
                        "✅ {}: {} posts, {} low / {} high words, {} edges",
                        ticker,
                        report.num_posts,
                        report.low_words.len(),
                        report.high_words.len(),
                        report.adjacency.edge_count()
                    );
                }
                Err(e) => {
                    failed += 1;
                    log::error!("❌ {}: failed to write report: {}", ticker, e);
                }
            },
            Ok((_, Ok(Calculation::EmptyRange { .. }))) => {
                empty += 1;
            }
            Ok((ticker, Err(e))) => {
                failed += 1;
                log::error!("❌ {}: {}", ticker, e);
            }
            Err(e) => {
                failed += 1;
                log::error!("❌ Ticker task panicked: {}", e);
            }
        }
    }

    log::info!(
        "🏁 Finished: {} written, {} empty, {} failed",
        written,
        empty,
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
