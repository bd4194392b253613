//! CSV file data adapter: one `<CODE>_<EXCHANGE>.csv` per instrument with a
//! `date,open,high,low,close,volume` header.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }
}

fn parse_column<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, ScreenerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| ScreenerError::Database {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| ScreenerError::Database {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let path = self.csv_path(code, exchange);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ScreenerError::NoData {
                    code: code.to_string(),
                    exchange: exchange.to_string(),
                });
            }
            Err(e) => {
                return Err(ScreenerError::Database {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ScreenerError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str: String = parse_column(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                ScreenerError::Database {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: code.to_string(),
                exchange: exchange.to_string(),
                date,
                open: parse_column(&record, 1, "open")?,
                high: parse_column(&record, 2, "high")?,
                low: parse_column(&record, 3, "low")?,
                close: parse_column(&record, 4, "close")?,
                volume: parse_column(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(code, exchange, bars = bars.len(), path = %path.display(), "loaded csv");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, ScreenerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScreenerError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ScreenerError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(&suffix) {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
