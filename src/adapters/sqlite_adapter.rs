//! SQLite storage adapter.
//!
//! Implements the price, instrument and indicator ports over one r2d2 pool.
//! Every write runs in a single `IMMEDIATE` transaction so concurrent writers
//! serialise at the start of a batch rather than failing halfway through it.

use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::indicator::persist::IndicatorPoint;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::stock::StockProfile;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::indicator_store_port::IndicatorStorePort;
use crate::ports::stock_port::StockInfoPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use std::time::Duration;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS stocks (
        ticker TEXT PRIMARY KEY,
        company_name TEXT NOT NULL,
        sector TEXT,
        current_price REAL,
        previous_close REAL,
        market_cap INTEGER,
        pe_ratio REAL,
        dividend_yield REAL,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS stock_prices (
        ticker TEXT NOT NULL,
        date TEXT NOT NULL,
        open REAL NOT NULL,
        high REAL NOT NULL,
        low REAL NOT NULL,
        close REAL NOT NULL,
        adjusted_close REAL NOT NULL,
        volume INTEGER NOT NULL,
        PRIMARY KEY (ticker, date)
    );
    CREATE TABLE IF NOT EXISTS technical_indicators (
        ticker TEXT NOT NULL,
        indicator_type TEXT NOT NULL,
        date TEXT NOT NULL,
        period INTEGER NOT NULL,
        value REAL NOT NULL,
        value2 REAL,
        value3 REAL,
        PRIMARY KEY (ticker, indicator_type, date, period)
    );
    CREATE INDEX IF NOT EXISTS idx_stock_prices_date ON stock_prices(date);
    CREATE INDEX IF NOT EXISTS idx_stocks_sector ON stocks(sector);
    CREATE INDEX IF NOT EXISTS idx_indicators_lookup
        ON technical_indicators(ticker, indicator_type, period, date);";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: r2d2::Error) -> MarketlensError {
    MarketlensError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> MarketlensError {
    MarketlensError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn stock_from_row(row: &Row<'_>) -> rusqlite::Result<StockProfile> {
    Ok(StockProfile {
        ticker: row.get(0)?,
        company_name: row.get(1)?,
        sector: row.get(2)?,
        current_price: row.get(3)?,
        previous_close: row.get(4)?,
        market_cap: row.get(5)?,
        pe_ratio: row.get(6)?,
        dividend_yield: row.get(7)?,
        is_active: row.get(8)?,
    })
}

const STOCK_COLUMNS: &str = "ticker, company_name, sector, current_price, previous_close,
     market_cap, pe_ratio, dividend_yield, is_active";

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MarketlensError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| MarketlensError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// A single-connection in-memory database.
    pub fn in_memory() -> Result<Self, MarketlensError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, MarketlensError> {
        self.pool.get().map_err(db_err)
    }

    pub fn initialize_schema(&self) -> Result<(), MarketlensError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }

    /// Inserts or replaces the instrument's reference data.
    pub fn upsert_stock(&self, stock: &StockProfile) -> Result<(), MarketlensError> {
        self.conn()?
            .execute(
                "INSERT INTO stocks (ticker, company_name, sector, current_price, previous_close,
                                     market_cap, pe_ratio, dividend_yield, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(ticker) DO UPDATE SET
                     company_name = excluded.company_name,
                     sector = excluded.sector,
                     current_price = excluded.current_price,
                     previous_close = excluded.previous_close,
                     market_cap = excluded.market_cap,
                     pe_ratio = excluded.pe_ratio,
                     dividend_yield = excluded.dividend_yield,
                     is_active = excluded.is_active",
                params![
                    stock.ticker,
                    stock.company_name,
                    stock.sector,
                    stock.current_price,
                    stock.previous_close,
                    stock.market_cap,
                    stock.pe_ratio,
                    stock.dividend_yield,
                    stock.is_active,
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    /// Records bars for `ticker`, creating a bare instrument row if needed.
    /// Dates already stored are left untouched. Returns the number of new bars.
    pub fn insert_bars(&self, ticker: &str, bars: &[PriceBar]) -> Result<usize, MarketlensError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        tx.execute(
            "INSERT OR IGNORE INTO stocks (ticker, company_name) VALUES (?1, ?1)",
            params![ticker],
        )
        .map_err(query_err)?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO stock_prices
                         (ticker, date, open, high, low, close, adjusted_close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(ticker, date) DO NOTHING",
                )
                .map_err(query_err)?;
            for bar in bars {
                inserted += stmt
                    .execute(params![
                        ticker,
                        format_date(bar.date),
                        bar.open,
                        bar.high,
                        bar.low,
                        bar.close,
                        bar.adjusted_close,
                        bar.volume,
                    ])
                    .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)?;
        Ok(inserted)
    }

    fn stock_exists(&self, ticker: &str) -> Result<bool, MarketlensError> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT 1 FROM stocks WHERE ticker = ?1",
                params![ticker],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;
        Ok(found.is_some())
    }
}

impl PriceDataPort for SqliteAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlensError> {
        if !self.stock_exists(ticker)? {
            return Err(MarketlensError::NotFound {
                ticker: ticker.to_string(),
            });
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT date, open, high, low, close, adjusted_close, volume
                 FROM stock_prices
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![ticker, format_date(start_date), format_date(end_date)],
                |row| {
                    Ok(PriceBar {
                        date: parse_date(0, row.get(0)?)?,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        adjusted_close: row.get(5)?,
                        volume: row.get(6)?,
                    })
                },
            )
            .map_err(query_err)?;

        let bars = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)?;
        PriceSeries::new(ticker, bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, MarketlensError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT ticker FROM stocks WHERE is_active = 1 ORDER BY ticker")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(query_err)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM stock_prices WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = parse_date(0, min_str).map_err(query_err)?;
                let max = parse_date(1, max_str).map_err(query_err)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl StockInfoPort for SqliteAdapter {
    fn stock_profile(&self, ticker: &str) -> Result<StockProfile, MarketlensError> {
        self.conn()?
            .query_row(
                &format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE ticker = ?1"),
                params![ticker],
                stock_from_row,
            )
            .optional()
            .map_err(query_err)?
            .ok_or_else(|| MarketlensError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    fn sector_peers(
        &self,
        sector: &str,
        ticker: &str,
    ) -> Result<Vec<StockProfile>, MarketlensError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {STOCK_COLUMNS} FROM stocks
                 WHERE sector = ?1 AND is_active = 1 AND ticker <> ?2
                 ORDER BY ticker"
            ))
            .map_err(query_err)?;
        let rows = stmt
            .query_map(params![sector, ticker], stock_from_row)
            .map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)
    }
}

impl IndicatorStorePort for SqliteAdapter {
    fn upsert_indicator_points(&self, points: &[IndicatorPoint]) -> Result<usize, MarketlensError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        let mut written = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO technical_indicators
                         (ticker, indicator_type, date, period, value, value2, value3)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(ticker, indicator_type, date, period) DO UPDATE SET
                         value = excluded.value,
                         value2 = excluded.value2,
                         value3 = excluded.value3",
                )
                .map_err(query_err)?;
            for p in points {
                written += stmt
                    .execute(params![
                        p.ticker,
                        p.kind.code(),
                        format_date(p.date),
                        p.period,
                        p.value,
                        p.value2,
                        p.value3,
                    ])
                    .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)?;
        Ok(written)
    }

    fn fetch_indicator_points(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndicatorPoint>, MarketlensError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT date, value, value2, value3 FROM technical_indicators
                 WHERE ticker = ?1 AND indicator_type = ?2 AND period = ?3
                   AND date >= ?4 AND date <= ?5
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![
                    ticker,
                    kind.code(),
                    period,
                    format_date(start_date),
                    format_date(end_date)
                ],
                |row| {
                    Ok(IndicatorPoint {
                        ticker: ticker.to_string(),
                        kind,
                        date: parse_date(0, row.get(0)?)?,
                        period,
                        value: row.get(1)?,
                        value2: row.get(2)?,
                        value3: row.get(3)?,
                    })
                },
            )
            .map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)
    }

    fn latest_indicator(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
    ) -> Result<Option<IndicatorPoint>, MarketlensError> {
        self.conn()?
            .query_row(
                "SELECT date, value, value2, value3 FROM technical_indicators
                 WHERE ticker = ?1 AND indicator_type = ?2 AND period = ?3
                 ORDER BY date DESC LIMIT 1",
                params![ticker, kind.code(), period],
                |row| {
                    Ok(IndicatorPoint {
                        ticker: ticker.to_string(),
                        kind,
                        date: parse_date(0, row.get(0)?)?,
                        period,
                        value: row.get(1)?,
                        value2: row.get(2)?,
                        value3: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: date(day),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            adjusted_close: close,
            volume: 1000,
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn sma_point(day: u32, value: f64) -> IndicatorPoint {
        IndicatorPoint {
            ticker: "AAPL".to_string(),
            kind: IndicatorKind::Sma,
            date: date(day),
            period: 20,
            value,
            value2: None,
            value3: None,
        }
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(MarketlensError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initialization_is_repeatable() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn fetch_series_returns_bars_in_window() {
        let adapter = adapter();
        adapter
            .insert_bars("AAPL", &[bar(3, 102.0), bar(1, 100.0), bar(2, 101.0)])
            .unwrap();

        let series = adapter.fetch_series("AAPL", date(2), date(3)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, date(2));
        assert_eq!(series.bars()[1].close, 102.0);
    }

    #[test]
    fn fetch_series_unknown_ticker_is_not_found() {
        let adapter = adapter();
        let err = adapter.fetch_series("NOPE", date(1), date(5)).unwrap_err();
        assert!(matches!(err, MarketlensError::NotFound { ticker } if ticker == "NOPE"));
    }

    #[test]
    fn known_ticker_without_bars_is_empty_series() {
        let adapter = adapter();
        adapter.upsert_stock(&StockProfile::new("NEW", "New Co")).unwrap();
        assert!(adapter.fetch_series("NEW", date(1), date(5)).unwrap().is_empty());
    }

    #[test]
    fn insert_bars_never_overwrites_existing_dates() {
        let adapter = adapter();
        assert_eq!(adapter.insert_bars("AAPL", &[bar(1, 100.0)]).unwrap(), 1);
        assert_eq!(
            adapter
                .insert_bars("AAPL", &[bar(1, 999.0), bar(2, 101.0)])
                .unwrap(),
            1
        );

        let series = adapter.fetch_series("AAPL", date(1), date(2)).unwrap();
        assert_eq!(series.bars()[0].close, 100.0);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn list_tickers_skips_inactive() {
        let adapter = adapter();
        adapter.insert_bars("MSFT", &[bar(1, 10.0)]).unwrap();
        adapter.insert_bars("AAPL", &[bar(1, 10.0)]).unwrap();
        adapter
            .upsert_stock(&StockProfile {
                is_active: false,
                ..StockProfile::new("DEAD", "Delisted")
            })
            .unwrap();

        assert_eq!(adapter.list_tickers().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn get_data_range() {
        let adapter = adapter();
        adapter
            .insert_bars("AAPL", &[bar(1, 100.0), bar(5, 102.0)])
            .unwrap();

        let (min, max, count) = adapter.get_data_range("AAPL").unwrap().unwrap();
        assert_eq!(min, date(1));
        assert_eq!(max, date(5));
        assert_eq!(count, 2);
        assert!(adapter.get_data_range("MSFT").unwrap().is_none());
    }

    #[test]
    fn stock_profile_round_trip() {
        let adapter = adapter();
        let stock = StockProfile {
            sector: Some("Technology".to_string()),
            current_price: Some(190.5),
            previous_close: Some(188.0),
            market_cap: Some(3_000_000_000_000),
            pe_ratio: Some(29.1),
            dividend_yield: Some(0.5),
            ..StockProfile::new("AAPL", "Apple Inc.")
        };
        adapter.upsert_stock(&stock).unwrap();
        assert_eq!(adapter.stock_profile("AAPL").unwrap(), stock);

        let updated = StockProfile {
            current_price: Some(191.0),
            ..stock
        };
        adapter.upsert_stock(&updated).unwrap();
        assert_eq!(adapter.stock_profile("AAPL").unwrap().current_price, Some(191.0));
    }

    #[test]
    fn stock_profile_missing_is_not_found() {
        let err = adapter().stock_profile("AAPL").unwrap_err();
        assert!(matches!(err, MarketlensError::NotFound { .. }));
    }

    #[test]
    fn sector_peers_exclude_self_and_inactive() {
        let adapter = adapter();
        let tech = |ticker: &str, active: bool| StockProfile {
            sector: Some("Technology".to_string()),
            is_active: active,
            ..StockProfile::new(ticker, ticker)
        };
        adapter.upsert_stock(&tech("AAPL", true)).unwrap();
        adapter.upsert_stock(&tech("MSFT", true)).unwrap();
        adapter.upsert_stock(&tech("OLD", false)).unwrap();
        adapter
            .upsert_stock(&StockProfile {
                sector: Some("Energy".to_string()),
                ..StockProfile::new("XOM", "Exxon")
            })
            .unwrap();

        let peers = adapter.sector_peers("Technology", "AAPL").unwrap();
        let tickers: Vec<&str> = peers.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["MSFT"]);
    }

    #[test]
    fn upsert_same_key_twice_keeps_one_row_with_latest_value() {
        let adapter = adapter();
        adapter.upsert_indicator_points(&[sma_point(10, 150.0)]).unwrap();
        adapter.upsert_indicator_points(&[sma_point(10, 155.0)]).unwrap();

        let rows = adapter
            .fetch_indicator_points("AAPL", IndicatorKind::Sma, 20, date(1), date(31))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 155.0);
    }

    #[test]
    fn failed_batch_leaves_previous_values() {
        let adapter = adapter();
        adapter.upsert_indicator_points(&[sma_point(1, 1.0)]).unwrap();

        // NaN binds as NULL and violates NOT NULL on the second row
        let result = adapter.upsert_indicator_points(&[sma_point(1, 2.0), sma_point(2, f64::NAN)]);
        assert!(matches!(result, Err(MarketlensError::DatabaseQuery { .. })));

        let rows = adapter
            .fetch_indicator_points("AAPL", IndicatorKind::Sma, 20, date(1), date(31))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(1));
        assert_eq!(rows[0].value, 1.0);
    }

    #[test]
    fn upsert_distinguishes_period() {
        let adapter = adapter();
        let mut sma50 = sma_point(10, 140.0);
        sma50.period = 50;
        adapter
            .upsert_indicator_points(&[sma_point(10, 150.0), sma50])
            .unwrap();

        let sma20 = adapter
            .fetch_indicator_points("AAPL", IndicatorKind::Sma, 20, date(1), date(31))
            .unwrap();
        assert_eq!(sma20.len(), 1);
        assert_eq!(sma20[0].value, 150.0);
    }

    #[test]
    fn upsert_overwrites_optional_columns() {
        let adapter = adapter();
        let mut p = IndicatorPoint {
            kind: IndicatorKind::Stochastic,
            period: 14,
            value2: Some(40.0),
            ..sma_point(10, 45.0)
        };
        adapter.upsert_indicator_points(std::slice::from_ref(&p)).unwrap();
        p.value2 = None;
        adapter.upsert_indicator_points(&[p]).unwrap();

        let latest = adapter
            .latest_indicator("AAPL", IndicatorKind::Stochastic, 14)
            .unwrap()
            .unwrap();
        assert_eq!(latest.value2, None);
    }

    #[test]
    fn latest_indicator_picks_most_recent_date() {
        let adapter = adapter();
        adapter
            .upsert_indicator_points(&[sma_point(3, 1.0), sma_point(9, 3.0), sma_point(5, 2.0)])
            .unwrap();

        let latest = adapter
            .latest_indicator("AAPL", IndicatorKind::Sma, 20)
            .unwrap()
            .unwrap();
        assert_eq!(latest.date, date(9));
        assert_eq!(latest.value, 3.0);
        assert!(adapter
            .latest_indicator("AAPL", IndicatorKind::Rsi, 14)
            .unwrap()
            .is_none());
    }
}
