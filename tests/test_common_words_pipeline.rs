//! End-to-end tests for the CommonWords engine
//!
//! Covers the full Loader → Aggregator → Selector → Co-occurrence flow over
//! in-memory, JSONL and SQLite sources, plus randomized checks of the
//! selection and graph invariants.

#[cfg(test)]
mod common_words_pipeline_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use commonwords::common_words::json_writer::{ADJACENCY_FILE, HIGH_WORDS_FILE, LOW_WORDS_FILE};
    use commonwords::common_words::sqlite_source::POSTS_SCHEMA;
    use commonwords::common_words::{
        CalculateParams, CommonWordsEngine, CommonWordsError, CommonWordsReport,
        DateWindow, FilterMetric, IdentityMapping, InMemoryPostSource, JsonReportWriter,
        JsonlPostSource, PostRecord, RankedWord, ReportWriterBackend, ScoreField, SelectorParams,
        SqlitePostSource, WordAggregator, WordMapping, WordSelector, WordsField,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rusqlite::{params, Connection};
    use std::collections::HashSet;
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 3, day, 12, 0, 0).unwrap()
    }

    fn create_test_record(words: &[&str], day: u32, score: f64) -> PostRecord {
        PostRecord {
            words: Some(WordsField::List(words.iter().map(|w| w.to_string()).collect())),
            created_at: Some(ts(day).to_rfc3339()),
            score: Some(ScoreField::Number(score)),
        }
    }

    /// Five posts with hand-computed statistics:
    /// a: count 3, total 2.0 | b: count 3, total -0.5 | c: count 2, total -0.5
    fn create_scenario_records() -> Vec<PostRecord> {
        vec![
            create_test_record(&["a", "b"], 1, 1.0),
            create_test_record(&["a", "c"], 2, -1.0),
            create_test_record(&["b", "c"], 3, 0.5),
            create_test_record(&["a"], 4, 2.0),
            create_test_record(&["b"], 5, -2.0),
        ]
    }

    fn march_2018() -> DateWindow {
        DateWindow::new(
            Utc.with_ymd_and_hms(2018, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 3, 31, 23, 59, 59).unwrap(),
        )
        .unwrap()
    }

    fn scenario_params(metric: FilterMetric) -> CalculateParams {
        CalculateParams::new("TEST", march_2018()).with_selector(SelectorParams {
            min_count_percentage: 0.01,
            top_n_words: 2,
            filter_metric: metric,
        })
    }

    fn create_test_engine(records: Vec<PostRecord>) -> CommonWordsEngine {
        let source = InMemoryPostSource::new().with_ticker("TEST", records);
        CommonWordsEngine::new(source, Arc::new(IdentityMapping))
    }

    fn words(list: &[RankedWord]) -> Vec<&str> {
        list.iter().map(|w| w.word.as_str()).collect()
    }

    fn report_for(engine: &CommonWordsEngine, params: &CalculateParams) -> CommonWordsReport {
        engine
            .calculate(params)
            .unwrap()
            .into_report()
            .expect("expected a non-empty report")
    }

    #[test]
    fn test_scenario_average_score() {
        let engine = create_test_engine(create_scenario_records());
        let report = report_for(&engine, &scenario_params(FilterMetric::AverageScore));

        assert_eq!(report.num_posts, 5);
        assert_eq!(report.min_count, 1);
        assert_eq!(words(&report.low_words), vec!["c", "b"]);
        assert_eq!(words(&report.high_words), vec!["a"]);

        let a = &report.high_words[0];
        assert_eq!(a.count, 3);
        assert!((a.total_score - 2.0).abs() < 1e-9);
        assert!((a.average_score - 2.0 / 3.0).abs() < 1e-9);

        let c = &report.low_words[0];
        assert_eq!(c.count, 2);
        assert!((c.average_score + 0.25).abs() < 1e-9);

        assert_eq!(report.adjacency.weight("a", "b"), 1);
        assert_eq!(report.adjacency.weight("a", "c"), 1);
        assert_eq!(report.adjacency.weight("b", "c"), 1);
        assert_eq!(report.adjacency.weight("c", "b"), 1);
        assert_eq!(report.adjacency.edge_count(), 3);
    }

    #[test]
    fn test_scenario_total_score_tie_keeps_first_appearance() {
        let engine = create_test_engine(create_scenario_records());
        let report = report_for(&engine, &scenario_params(FilterMetric::TotalScore));

        // b and c tie at -0.5; b appeared first
        assert_eq!(words(&report.low_words), vec!["b", "c"]);
        assert_eq!(words(&report.high_words), vec!["a"]);
    }

    #[test]
    fn test_scenario_count() {
        let engine = create_test_engine(create_scenario_records());
        let report = report_for(&engine, &scenario_params(FilterMetric::Count));

        assert_eq!(words(&report.low_words), vec!["c", "a"]);
        assert_eq!(words(&report.high_words), vec!["b"]);
    }

    #[test]
    fn test_duplicate_words_counted_once_per_post() {
        let records = vec![
            create_test_record(&["moon", "moon", "moon"], 1, 1.0),
            create_test_record(&["moon", "dump"], 2, -1.0),
        ];
        let engine = create_test_engine(records);
        let params = scenario_params(FilterMetric::Count);
        let report = report_for(&engine, &params);

        let moon = report
            .low_words
            .iter()
            .chain(report.high_words.iter())
            .find(|w| w.word == "moon")
            .unwrap();
        assert_eq!(moon.count, 2);
        assert!(moon.total_score.abs() < 1e-9);
    }

    #[test]
    fn test_empty_range_writes_nothing() {
        let engine = create_test_engine(create_scenario_records());
        let window = DateWindow::new(
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let calculation = engine.calculate(&CalculateParams::new("TEST", window)).unwrap();
        assert!(calculation.is_empty_range());
        assert!(calculation.report().is_none());

        let dir = tempdir().unwrap();
        let mut writer = JsonReportWriter::new(dir.path()).unwrap();
        if let Some(report) = calculation.into_report() {
            writer.write_report(&report).unwrap();
        }
        assert!(!writer.ticker_dir("TEST").exists());
    }

    #[test]
    fn test_unknown_ticker_is_data_not_found() {
        let engine = create_test_engine(create_scenario_records());
        let result = engine.calculate(&CalculateParams::new("NOPE", march_2018()));

        match result {
            Err(CommonWordsError::DataNotFound { ticker }) => assert_eq!(ticker, "NOPE"),
            other => panic!("expected DataNotFound, got {:?}", other.map(|c| c.is_empty_range())),
        }
    }

    #[test]
    fn test_repeated_calculation_is_byte_identical() {
        let engine = create_test_engine(create_scenario_records());
        let params = scenario_params(FilterMetric::AverageScore).with_workers(3);

        let first = serde_json::to_string(&report_for(&engine, &params)).unwrap();
        let second = serde_json::to_string(&report_for(&engine, &params)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_word_mapping_merges_aliases() {
        let records = vec![
            create_test_record(&["fed", "hike"], 1, -1.0),
            create_test_record(&["federal_reserve", "hike"], 2, -0.5),
        ];
        let source = InMemoryPostSource::new().with_ticker("TEST", records);
        let mapping = WordMapping::from_pairs([("federal_reserve", "fed")]);
        let engine = CommonWordsEngine::new(source, Arc::new(mapping));

        let report = report_for(&engine, &scenario_params(FilterMetric::Count));
        let all: Vec<&RankedWord> = report.low_words.iter().chain(report.high_words.iter()).collect();

        assert!(all.iter().all(|w| w.word != "federal_reserve"));
        assert_eq!(all.iter().find(|w| w.word == "fed").unwrap().count, 2);
        assert_eq!(report.adjacency.weight("fed", "hike"), 2);
    }

    #[test]
    fn test_jsonl_source_end_to_end() {
        let dir = tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("TEST.jsonl")).unwrap();
        writeln!(file, r#"{{"words": ["a", "b"], "created_at": "2018-03-01T12:00:00+00:00", "score": 1.0}}"#).unwrap();
        writeln!(file, r#"{{"words": "a c", "created_at": "2018-03-02 12:00:00+00:00", "score": "-1.0"}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"words": ["b", "c"], "timestamp": "2018-03-03T12:00:00Z", "score": 0.5}}"#).unwrap();
        writeln!(file, r#"{{"words": ["a"], "created_at": "2018-03-04T12:00:00Z", "score": 2.0}}"#).unwrap();
        writeln!(file, r#"{{"words": ["b"], "created_at": "2018-03-05T12:00:00Z", "score": -2.0}}"#).unwrap();
        writeln!(file, r#"{{"words": ["zzz"], "created_at": "2018-03-06T12:00:00Z"}}"#).unwrap();
        drop(file);

        let engine = CommonWordsEngine::new(JsonlPostSource::new(dir.path()), Arc::new(IdentityMapping));
        let report = report_for(&engine, &scenario_params(FilterMetric::AverageScore));

        assert_eq!(report.num_posts, 5);
        assert_eq!(report.skipped_records, 2);
        assert_eq!(words(&report.low_words), vec!["c", "b"]);
        assert_eq!(words(&report.high_words), vec!["a"]);
    }

    #[test]
    fn test_sqlite_source_end_to_end() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("posts.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(POSTS_SCHEMA).unwrap();
            let rows = [
                ("a b", "2018-03-01T12:00:00Z", 1.0),
                ("a c", "2018-03-02T12:00:00Z", -1.0),
                ("b c", "2018-03-03T12:00:00Z", 0.5),
                ("a", "2018-03-04T12:00:00Z", 2.0),
                ("b", "2018-03-05T12:00:00Z", -2.0),
            ];
            for (words, created_at, score) in rows {
                conn.execute(
                    "INSERT INTO posts (ticker, words, created_at, score) VALUES ('TEST', ?1, ?2, ?3)",
                    params![words, created_at, score],
                )
                .unwrap();
            }
            conn.execute(
                "INSERT INTO posts (ticker, words, created_at, score) VALUES ('OTHER', 'x y', '2018-03-01T00:00:00Z', 9.0)",
                [],
            )
            .unwrap();
        }

        let source = SqlitePostSource::open(&db_path).unwrap();
        let engine = CommonWordsEngine::new(source, Arc::new(IdentityMapping));
        let report = report_for(&engine, &scenario_params(FilterMetric::Count));

        assert_eq!(report.num_posts, 5);
        assert_eq!(words(&report.low_words), vec!["c", "a"]);
        assert_eq!(words(&report.high_words), vec!["b"]);
        assert_eq!(report.adjacency.node_count(), 3);
    }

    #[test]
    fn test_jsonl_corrupt_bytes_are_skipped() {
        let dir = tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("TEST.jsonl")).unwrap();
        writeln!(file, r#"{{"words": ["a", "b"], "created_at": "2018-03-01T12:00:00Z", "score": 1.0}}"#).unwrap();
        file.write_all(b"{\"words\": [\"\xff\xfe\"], \"created_at\": \"2018-03-01T13:00:00Z\", \"score\": 5.0}\n")
            .unwrap();
        file.write_all(b"\x00\x9f\x92\x96 binary junk\n").unwrap();
        writeln!(file, r#"{{"words": ["a", "c"], "created_at": "2018-03-02T12:00:00Z", "score": -1.0}}"#).unwrap();
        drop(file);

        let engine = CommonWordsEngine::new(JsonlPostSource::new(dir.path()), Arc::new(IdentityMapping));
        let report = report_for(&engine, &scenario_params(FilterMetric::Count));

        assert_eq!(report.num_posts, 2);
        assert_eq!(report.skipped_records, 2);
        assert_eq!(report.adjacency.weight("a", "b"), 1);
        assert_eq!(report.adjacency.weight("a", "c"), 1);
    }

    #[test]
    fn test_sqlite_mistyped_columns_are_skipped() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("posts.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(POSTS_SCHEMA).unwrap();
            conn.execute_batch(
                "INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', 'a b', '2018-03-01T12:00:00Z', 1.0);
                 INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', 'a b', x'010203', 1.0);
                 INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', x'0102', '2018-03-01T12:00:00Z', 1.0);
                 INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', CAST(x'fffe' AS TEXT), '2018-03-01T12:00:00Z', 1.0);
                 INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', 'a c', '2018-03-02T12:00:00Z', x'00');
                 INSERT INTO posts (ticker, words, created_at, score)
                     VALUES ('TEST', 'b c', '2018-03-03T12:00:00Z', 0.5);",
            )
            .unwrap();
        }

        let source = SqlitePostSource::open(&db_path).unwrap();
        let engine = CommonWordsEngine::new(source, Arc::new(IdentityMapping));
        let report = report_for(&engine, &scenario_params(FilterMetric::Count));

        assert_eq!(report.num_posts, 2);
        assert_eq!(report.skipped_records, 4);
        assert_eq!(report.adjacency.weight("a", "b"), 1);
        assert_eq!(report.adjacency.weight("b", "c"), 1);
        assert_eq!(report.adjacency.weight("a", "c"), 0);
    }

    #[test]
    fn test_path_like_ticker_is_rejected() {
        let source = InMemoryPostSource::new().with_ticker("../TEST", create_scenario_records());
        let engine = CommonWordsEngine::new(source, Arc::new(IdentityMapping));

        assert!(matches!(
            engine.calculate(&CalculateParams::new("../TEST", march_2018())),
            Err(CommonWordsError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_json_writer_output_layout() {
        let engine = create_test_engine(create_scenario_records());
        let report = report_for(&engine, &scenario_params(FilterMetric::AverageScore));

        let dir = tempdir().unwrap();
        let mut writer = JsonReportWriter::new(dir.path()).unwrap();
        writer.write_report(&report).unwrap();

        let ticker_dir = dir.path().join("TEST");
        let high: Vec<RankedWord> =
            serde_json::from_str(&fs::read_to_string(ticker_dir.join(HIGH_WORDS_FILE)).unwrap()).unwrap();
        let low: Vec<RankedWord> =
            serde_json::from_str(&fs::read_to_string(ticker_dir.join(LOW_WORDS_FILE)).unwrap()).unwrap();
        let adjacency: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ticker_dir.join(ADJACENCY_FILE)).unwrap()).unwrap();

        assert_eq!(high, report.high_words);
        assert_eq!(low, report.low_words);
        assert_eq!(
            adjacency,
            serde_json::json!({
                "a": {"b": 1, "c": 1},
                "b": {"a": 1, "c": 1},
                "c": {"a": 1, "b": 1}
            })
        );
    }

    fn create_random_records(rng: &mut StdRng, num_posts: usize, vocab_size: usize) -> Vec<PostRecord> {
        let vocab: Vec<String> = (0..vocab_size).map(|i| format!("w{:02}", i)).collect();
        let base = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();

        (0..num_posts)
            .map(|_| {
                let len = rng.gen_range(0..8);
                let words: Vec<String> = (0..len)
                    .map(|_| vocab[rng.gen_range(0..vocab_size)].clone())
                    .collect();
                let created_at = base + Duration::minutes(rng.gen_range(0..60 * 24 * 365));
                PostRecord {
                    words: Some(WordsField::List(words)),
                    created_at: Some(created_at.to_rfc3339()),
                    score: Some(ScoreField::Number(rng.gen_range(-1.0..1.0))),
                }
            })
            .collect()
    }

    fn year_2018() -> DateWindow {
        DateWindow::new(
            Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 12, 31, 23, 59, 59).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_random_selection_invariants() {
        let mut rng = StdRng::seed_from_u64(7);

        for round in 0..20 {
            let records = create_random_records(&mut rng, 200, 30);
            let top_n = rng.gen_range(0..20);
            let metric = FilterMetric::all()[round % 3];
            let engine = create_test_engine(records);
            let params = CalculateParams::new("TEST", year_2018()).with_selector(SelectorParams {
                min_count_percentage: rng.gen_range(0.0..0.2),
                top_n_words: top_n,
                filter_metric: metric,
            });

            let Some(report) = engine.calculate(&params).unwrap().into_report() else {
                continue;
            };

            assert!(report.low_words.len() <= top_n);
            assert!(report.high_words.len() <= top_n);

            let low: HashSet<&str> = words(&report.low_words).into_iter().collect();
            let high: HashSet<&str> = words(&report.high_words).into_iter().collect();
            assert!(low.is_disjoint(&high), "round {}: low and high overlap", round);

            for word in report.low_words.iter().chain(report.high_words.iter()) {
                assert!(word.count >= report.min_count);
            }

            let candidates: HashSet<&str> = low.union(&high).copied().collect();
            let nodes: HashSet<&str> = report.adjacency.nodes().map(String::as_str).collect();
            assert_eq!(nodes, candidates);
        }
    }

    #[test]
    fn test_random_graph_invariants() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..10 {
            let records = create_random_records(&mut rng, 300, 25);
            let engine = create_test_engine(records);
            let params = CalculateParams::new("TEST", year_2018()).with_selector(SelectorParams {
                min_count_percentage: 0.01,
                top_n_words: 8,
                filter_metric: FilterMetric::AverageScore,
            });
            let report = report_for(&engine, &params);

            let count_of = |word: &str| {
                report
                    .low_words
                    .iter()
                    .chain(report.high_words.iter())
                    .find(|w| w.word == word)
                    .map(|w| w.count)
                    .unwrap()
            };

            for (word, neighbours) in report.adjacency.as_map() {
                assert!(!neighbours.contains_key(word), "self-loop on {}", word);
                for (other, weight) in neighbours {
                    assert!(*weight > 0);
                    assert_eq!(report.adjacency.weight(other, word), *weight);
                    assert!(*weight <= count_of(word).min(count_of(other)));
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut rng = StdRng::seed_from_u64(1234);
        let records = create_random_records(&mut rng, 1000, 40);
        let engine = create_test_engine(records);

        let serial = report_for(
            &engine,
            &CalculateParams::new("TEST", year_2018()).with_selector(SelectorParams {
                min_count_percentage: 0.02,
                top_n_words: 10,
                filter_metric: FilterMetric::TotalScore,
            }),
        );

        for workers in [2, 4, 7, 16] {
            let params = CalculateParams::new("TEST", year_2018())
                .with_selector(SelectorParams {
                    min_count_percentage: 0.02,
                    top_n_words: 10,
                    filter_metric: FilterMetric::TotalScore,
                })
                .with_workers(workers);
            let parallel = report_for(&engine, &params);
            assert_eq!(parallel.adjacency, serial.adjacency, "workers={}", workers);
        }
    }

    #[test]
    fn test_threshold_monotonicity() {
        let mut rng = StdRng::seed_from_u64(99);
        let records = create_random_records(&mut rng, 400, 50);
        let posts: Vec<_> = records.into_iter().filter_map(|r| r.into_post().ok()).collect();
        let stats = WordAggregator::aggregate(&posts);

        let mut previous = usize::MAX;
        for pct in [0.0, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0] {
            let selection = WordSelector::new(SelectorParams {
                min_count_percentage: pct,
                top_n_words: 5,
                filter_metric: FilterMetric::Count,
            })
            .select(&stats);

            assert!(selection.eligible <= previous, "eligible grew at pct={}", pct);
            previous = selection.eligible;
        }
    }
}
