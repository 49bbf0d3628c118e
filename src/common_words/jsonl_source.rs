//! JSONL post source: one `<TICKER>.jsonl` file per ticker

use super::error::{CommonWordsError, MalformedRecord};
use super::post::PostRecord;
use super::source::{check_ticker, PostSource, RecordResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct JsonlPostSource {
    data_dir: PathBuf,
}

impl JsonlPostSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn ticker_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", ticker))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl PostSource for JsonlPostSource {
    fn fetch(&self, ticker: &str) -> Result<Vec<RecordResult>, CommonWordsError> {
        check_ticker(ticker)?;

        let path = self.ticker_path(ticker);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CommonWordsError::DataNotFound {
                    ticker: ticker.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        // Split on raw bytes: a line that is not UTF-8 is one bad record, not a failed file
        let mut records = Vec::new();
        for chunk in BufReader::new(file).split(b'\n') {
            let bytes = chunk?;
            let line = match std::str::from_utf8(&bytes) {
                Ok(line) => line.trim(),
                Err(_) => {
                    records.push(Err(MalformedRecord::new("invalid UTF-8")));
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            records.push(PostRecord::from_jsonl(line));
        }

        log::debug!("📖 Read {} records from {}", records.len(), path.display());
        Ok(records)
    }

    fn source_type(&self) -> &'static str {
        "JSONL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_records_and_keeps_bad_lines_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("TSLA.jsonl")).unwrap();
        writeln!(file, r#"{{"words":["model","3"],"created_at":"2018-01-02T10:00:00Z","score":0.4}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"words":["recall""#).unwrap();
        writeln!(file, r#"{{"words":"production hell","created_at":"2018-01-03T10:00:00Z","score":-0.9}}"#).unwrap();
        drop(file);

        let source = JsonlPostSource::new(dir.path());
        let records = source.fetch("TSLA").unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[1].is_err());
        assert!(records[2].is_ok());
    }

    #[test]
    fn test_invalid_utf8_line_is_a_bad_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("T.jsonl")).unwrap();
        writeln!(file, r#"{{"words":["beat"],"created_at":"2018-01-02T10:00:00Z","score":0.4}}"#).unwrap();
        file.write_all(b"{\"words\":[\"\xff\xfe\"],\"created_at\":\"2018-01-02T11:00:00Z\",\"score\":1}\n")
            .unwrap();
        writeln!(file, r#"{{"words":["miss"],"created_at":"2018-01-03T10:00:00Z","score":-0.2}}"#).unwrap();
        drop(file);

        let source = JsonlPostSource::new(dir.path());
        let records = source.fetch("T").unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert_eq!(records[1].as_ref().unwrap_err().reason, "invalid UTF-8");
        assert!(records[2].is_ok());
    }

    #[test]
    fn test_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("T.jsonl"),
            b"{\"words\":[\"a\"],\"created_at\":\"2018-01-02T10:00:00Z\",\"score\":1}\r\n\r\n",
        )
        .unwrap();

        let records = JsonlPostSource::new(dir.path()).fetch("T").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_ok());
    }

    #[test]
    fn test_missing_file_is_data_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonlPostSource::new(dir.path());

        assert!(matches!(
            source.fetch("NOPE"),
            Err(CommonWordsError::DataNotFound { .. })
        ));
    }

    #[test]
    fn test_path_like_ticker_rejected() {
        let source = JsonlPostSource::new("data");
        assert!(matches!(
            source.fetch("../secrets"),
            Err(CommonWordsError::InvalidParameters(_))
        ));
    }
}
