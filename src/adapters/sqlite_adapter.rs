//! SQLite data adapter over an `ohlcv` table.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> ScreenerError {
    ScreenerError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> ScreenerError {
    ScreenerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScreenerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScreenerError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), ScreenerError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    code TEXT NOT NULL,
                    exchange TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (code, exchange, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_code_exchange ON ohlcv(code, exchange);",
            )
            .map_err(query_error)
    }

    pub fn insert_bars(&self, bars: &[OhlcvBar]) -> Result<(), ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (code, exchange, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    bar.code,
                    bar.exchange,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, exchange, date, open, high, low, close, volume
                 FROM ohlcv
                 WHERE code = ?1 AND exchange = ?2 AND date >= ?3 AND date <= ?4
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let start = start_date.format(DATE_FORMAT).to_string();
        let end = end_date.format(DATE_FORMAT).to_string();
        let rows = stmt
            .query_map(params![code, exchange, start, end], |row| {
                let date_str: String = row.get(2)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                })?;
                Ok(OhlcvBar {
                    code: row.get(0)?,
                    exchange: row.get(1)?,
                    date,
                    open: row.get(3)?,
                    high: row.get(4)?,
                    low: row.get(5)?,
                    close: row.get(6)?,
                    volume: row.get(7)?,
                })
            })
            .map_err(query_error)?;

        let bars = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        debug!(code, exchange, bars = bars.len(), "loaded sqlite");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT code FROM ohlcv WHERE exchange = ?1 ORDER BY code")
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![exchange], |row| row.get(0))
            .map_err(query_error)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }
}
