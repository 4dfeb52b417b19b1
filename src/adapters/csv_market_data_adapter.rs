//! CSV file market data adapter.
//!
//! Bars live in `<dir>/<SYMBOL>_<TF>.csv` with columns
//! `timestamp,open,high,low,close,volume`, oldest first; quotes in
//! `<dir>/quotes.csv` with columns `symbol,bid,ask,spread`.
//!
//! Bars are returned in file order. Ordering and price sanity are checked
//! by `BarSeries`, so a bad file surfaces as `InvalidBars`.

use crate::domain::decision::Quote;
use crate::domain::error::NewstraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::{MarketDataPort, Timeframe};
use chrono::NaiveDateTime;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const QUOTES_FILE: &str = "quotes.csv";

pub struct CsvMarketDataAdapter {
    base_path: PathBuf,
}

impl CsvMarketDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn bars_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }

    fn read(&self, path: &PathBuf, symbol: &str) -> Result<String, NewstraderError> {
        fs::read_to_string(path).map_err(|e| NewstraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn field<T: FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<T, NewstraderError> {
    let raw = record
        .get(index)
        .ok_or_else(|| NewstraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("missing {} column", name),
        })?;
    raw.trim()
        .parse()
        .map_err(|_| NewstraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("invalid {} value '{}'", name, raw),
        })
}

fn finite_field(
    record: &StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<f64, NewstraderError> {
    let value: f64 = field(record, index, name, symbol)?;
    if !value.is_finite() {
        return Err(NewstraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("non-finite {} value", name),
        });
    }
    Ok(value)
}

impl MarketDataPort for CsvMarketDataAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<OhlcvBar>, NewstraderError> {
        let path = self.bars_path(symbol, timeframe);
        let content = self.read(&path, symbol)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| NewstraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts: String = field(&record, 0, "timestamp", symbol)?;
            let timestamp = NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).map_err(|e| {
                NewstraderError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("invalid timestamp '{}': {}", ts, e),
                }
            })?;

            bars.push(OhlcvBar {
                timestamp,
                open: field(&record, 1, "open", symbol)?,
                high: field(&record, 2, "high", symbol)?,
                low: field(&record, 3, "low", symbol)?,
                close: field(&record, 4, "close", symbol)?,
                volume: field(&record, 5, "volume", symbol)?,
            });
        }

        let skip = bars.len().saturating_sub(count);
        log::debug!(
            "loaded {} {} bars for {} from {}",
            bars.len() - skip,
            timeframe,
            symbol,
            path.display()
        );
        Ok(bars.split_off(skip))
    }

    fn quote(&self, symbol: &str) -> Result<Quote, NewstraderError> {
        let path = self.base_path.join(QUOTES_FILE);
        let content = self.read(&path, symbol)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for result in rdr.records() {
            let record = result.map_err(|e| NewstraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;
            if record.get(0).map(str::trim) != Some(symbol) {
                continue;
            }
            return Ok(Quote {
                bid: finite_field(&record, 1, "bid", symbol)?,
                ask: finite_field(&record, 2, "ask", symbol)?,
                spread: finite_field(&record, 3, "spread", symbol)?,
            });
        }

        Err(NewstraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("no quote in {}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::BarSeries;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-15 00:00:00,1.0900,1.0910,1.0890,1.0905,500\n\
            2024-01-15 01:00:00,1.0905,1.0915,1.0895,1.0910,600\n\
            2024-01-15 02:00:00,1.0910,1.0920,1.0900,1.0915,700\n";

        fs::write(path.join("EURUSD_H1.csv"), csv_content).unwrap();
        fs::write(
            path.join("quotes.csv"),
            "symbol,bid,ask,spread\nEURUSD,1.0914,1.0916,2\nUS500,5100.0,5100.5,50\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_oldest_first() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketDataAdapter::new(path);

        let bars = adapter.fetch_bars("EURUSD", Timeframe::H1, 10).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].close, 1.0905);
        assert_eq!(bars[0].volume, 500);
        assert_eq!(bars[2].high, 1.0920);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn fetch_bars_keeps_most_recent() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketDataAdapter::new(path);

        let bars = adapter.fetch_bars("EURUSD", Timeframe::H1, 2).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 1.0915);
    }

    #[test]
    fn fetch_bars_missing_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketDataAdapter::new(path);

        let result = adapter.fetch_bars("EURUSD", Timeframe::D1, 10);

        assert!(matches!(result, Err(NewstraderError::DataUnavailable { .. })));
    }

    #[test]
    fn fetch_bars_bad_value_is_unavailable() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("GBPUSD_H1.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15 00:00:00,1.2,x,1.1,1.2,1\n",
        )
        .unwrap();
        let adapter = CsvMarketDataAdapter::new(path);

        let err = adapter.fetch_bars("GBPUSD", Timeframe::H1, 10).unwrap_err();

        assert!(err.to_string().contains("invalid high value"));
    }

    #[test]
    fn out_of_order_file_is_not_repaired() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("GBPUSD_H1.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-15 01:00:00,1.27,1.28,1.26,1.27,10\n\
             2024-01-15 00:00:00,1.26,1.27,1.25,1.26,10\n",
        )
        .unwrap();
        let adapter = CsvMarketDataAdapter::new(path);

        let bars = adapter.fetch_bars("GBPUSD", Timeframe::H1, 10).unwrap();
        assert!(bars[0].timestamp > bars[1].timestamp);

        let err = BarSeries::new("GBPUSD", bars).unwrap_err();
        assert!(matches!(err, NewstraderError::InvalidBars { .. }));
    }

    #[test]
    fn nan_close_is_invalid_bars() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("GBPUSD_H1.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-15 00:00:00,1.26,1.27,1.25,NaN,10\n\
             2024-01-15 01:00:00,1.27,1.28,1.26,1.27,10\n",
        )
        .unwrap();
        let adapter = CsvMarketDataAdapter::new(path);

        let bars = adapter.fetch_bars("GBPUSD", Timeframe::H1, 10).unwrap();
        let err = BarSeries::new("GBPUSD", bars).unwrap_err();

        assert!(matches!(err, NewstraderError::InvalidBars { .. }));
    }

    #[test]
    fn quote_nan_is_unavailable() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("quotes.csv"),
            "symbol,bid,ask,spread\nEURUSD,NaN,1.0916,2\n",
        )
        .unwrap();
        let adapter = CsvMarketDataAdapter::new(path);

        let err = adapter.quote("EURUSD").unwrap_err();

        assert!(err.to_string().contains("non-finite bid"));
    }

    #[test]
    fn quote_lookup() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketDataAdapter::new(path);

        let quote = adapter.quote("US500").unwrap();

        assert_eq!(quote.bid, 5100.0);
        assert_eq!(quote.ask, 5100.5);
        assert_eq!(quote.spread, 50.0);
    }

    #[test]
    fn quote_unknown_symbol_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketDataAdapter::new(path);

        assert!(matches!(
            adapter.quote("XAUUSD"),
            Err(NewstraderError::DataUnavailable { .. })
        ));
    }
}
