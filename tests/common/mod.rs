#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use newstrader::domain::decision::{OrderIntent, Quote};
use newstrader::domain::error::NewstraderError;
use newstrader::domain::event::{EconomicEvent, Importance};
use newstrader::domain::instrument::{default_currencies, InstrumentProfile};
pub use newstrader::domain::ohlcv::OhlcvBar;
use newstrader::ports::calendar_port::{CalendarPort, EventFilter};
use newstrader::ports::execution_port::{ExecutionPort, ExecutionReport};
use newstrader::ports::market_data_port::{MarketDataPort, Timeframe};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

pub struct MockMarketData {
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub quotes: HashMap<String, Quote>,
    pub errors: HashMap<String, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, symbol: &str, bid: f64, ask: f64, spread: f64) -> Self {
        self.quotes
            .insert(symbol.to_string(), Quote { bid, ask, spread });
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), NewstraderError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(NewstraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<OhlcvBar>, NewstraderError> {
        self.check(symbol)?;
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(count);
        Ok(bars[skip..].to_vec())
    }

    fn quote(&self, symbol: &str) -> Result<Quote, NewstraderError> {
        self.check(symbol)?;
        self.quotes
            .get(symbol)
            .copied()
            .ok_or_else(|| NewstraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no quote".into(),
            })
    }
}

pub struct MockCalendar {
    pub events: Vec<EconomicEvent>,
    pub error: Option<String>,
}

impl MockCalendar {
    pub fn new(events: Vec<EconomicEvent>) -> Self {
        Self { events, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            events: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl CalendarPort for MockCalendar {
    fn upcoming_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EconomicEvent>, NewstraderError> {
        if let Some(reason) = &self.error {
            return Err(NewstraderError::Calendar {
                reason: reason.clone(),
            });
        }
        Ok(self
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

pub struct MockExecutor {
    pub equity: f64,
    pub reject_with: Option<String>,
    pub submitted: RefCell<Vec<OrderIntent>>,
}

impl MockExecutor {
    pub fn new(equity: f64) -> Self {
        Self {
            equity,
            reject_with: None,
            submitted: RefCell::new(Vec::new()),
        }
    }

    pub fn rejecting(equity: f64, reason: &str) -> Self {
        Self {
            reject_with: Some(reason.to_string()),
            ..Self::new(equity)
        }
    }

    pub fn submitted(&self) -> Vec<OrderIntent> {
        self.submitted.borrow().clone()
    }
}

impl ExecutionPort for MockExecutor {
    fn submit(&self, order: &OrderIntent) -> Result<ExecutionReport, NewstraderError> {
        self.submitted.borrow_mut().push(order.clone());
        Ok(match &self.reject_with {
            Some(reason) => ExecutionReport::rejected(reason.clone()),
            None => ExecutionReport::accepted(self.submitted.borrow().len() as u64),
        })
    }

    fn account_equity(&self) -> Result<f64, NewstraderError> {
        Ok(self.equity)
    }
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub fn series_start() -> NaiveDateTime {
    ts(2024, 3, 1, 0)
}

/// Hourly bars moving `step` per bar, each spanning `half_range` either
/// side of the close.
pub fn generate_bars(
    count: usize,
    start_price: f64,
    step: f64,
    half_range: f64,
) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            OhlcvBar {
                timestamp: series_start() + Duration::hours(i as i64),
                open: close - step,
                high: close + half_range,
                low: close - half_range,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Time just after the last of `count` generated bars.
pub fn after_bars(count: usize) -> NaiveDateTime {
    series_start() + Duration::hours(count as i64)
}

pub fn event(name: &str, actual: f64, forecast: f64, scheduled: NaiveDateTime) -> EconomicEvent {
    EconomicEvent {
        name: name.to_string(),
        country: "US".to_string(),
        importance: Importance::High,
        actual: Some(actual),
        forecast: Some(forecast),
        scheduled,
    }
}

/// Currencies follow the symbol: `EURUSD` gets EUR and USD, an index none.
pub fn profile(
    symbol: &str,
    contract_size: f64,
    base_volume: f64,
    max_spread: f64,
    correlations: &[(&str, f64)],
) -> InstrumentProfile {
    InstrumentProfile {
        symbol: symbol.to_string(),
        pip_value: if contract_size > 1.0 { 0.0001 } else { 0.01 },
        contract_size,
        base_volume,
        max_spread,
        currencies: default_currencies(symbol),
        correlations: correlations
            .iter()
            .map(|(f, c)| (f.to_string(), *c))
            .collect::<BTreeMap<_, _>>(),
    }
}

pub fn eurusd() -> InstrumentProfile {
    profile("EURUSD", 100_000.0, 0.01, 20.0, &[("USD", -0.8)])
}

pub fn us500() -> InstrumentProfile {
    profile("US500", 1.0, 0.1, 50.0, &[("SPX", 1.0), ("USD", -0.3)])
}

pub fn bars_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
