//! Per-bar indicator rows assembled from the individual indicator series.

use crate::domain::error::NewstraderError;
use crate::domain::indicator::{
    atr, bollinger, calculate_atr, calculate_bollinger, calculate_macd, calculate_rsi,
    calculate_sma, macd, rsi, IndicatorValue,
};
use crate::domain::ohlcv::BarSeries;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;

pub const SMA_FAST: usize = 20;
pub const SMA_SLOW: usize = 50;

/// Fewest bars an analysis will accept. The slow SMA is the longest window.
pub const MIN_ANALYSIS_BARS: usize = SMA_SLOW;

/// Every indicator at one bar. `None` marks a window that is not yet filled.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi14: Option<f64>,
    pub atr14: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
}

/// A row with every indicator defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub rsi14: f64,
    pub atr14: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

impl IndicatorRow {
    /// `None` while any window is unfilled or any value is not finite.
    pub fn complete(&self) -> Option<CompleteRow> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(CompleteRow {
            timestamp: self.timestamp,
            close: finite(Some(self.close))?,
            sma20: finite(self.sma20)?,
            sma50: finite(self.sma50)?,
            rsi14: finite(self.rsi14)?,
            atr14: finite(self.atr14)?,
            upper_band: finite(self.upper_band)?,
            lower_band: finite(self.lower_band)?,
            macd: finite(self.macd)?,
            macd_signal: finite(self.macd_signal)?,
        })
    }
}

pub fn compute_rows(bars: &[OhlcvBar]) -> Vec<IndicatorRow> {
    let sma20 = calculate_sma(bars, SMA_FAST).simple_values();
    let sma50 = calculate_sma(bars, SMA_SLOW).simple_values();
    let rsi14 = calculate_rsi(bars, rsi::DEFAULT_PERIOD).simple_values();
    let atr14 = calculate_atr(bars, atr::DEFAULT_PERIOD).simple_values();
    let bands = calculate_bollinger(bars, bollinger::DEFAULT_PERIOD, bollinger::DEFAULT_MULT_X100);
    let macd_series = calculate_macd(
        bars,
        macd::DEFAULT_FAST,
        macd::DEFAULT_SLOW,
        macd::DEFAULT_SIGNAL,
    );

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let (upper_band, lower_band) = match bands.values[i].value {
                Some(IndicatorValue::Bollinger { upper, lower, .. }) => (Some(upper), Some(lower)),
                _ => (None, None),
            };
            let (macd, macd_signal) = match macd_series.values[i].value {
                Some(IndicatorValue::Macd { line, signal, .. }) => (Some(line), Some(signal)),
                _ => (None, None),
            };
            IndicatorRow {
                timestamp: bar.timestamp,
                close: bar.close,
                sma20: sma20[i],
                sma50: sma50[i],
                rsi14: rsi14[i],
                atr14: atr14[i],
                upper_band,
                lower_band,
                macd,
                macd_signal,
            }
        })
        .collect()
}

pub fn latest_complete_row(rows: &[IndicatorRow]) -> Option<CompleteRow> {
    rows.iter().rev().find_map(IndicatorRow::complete)
}

/// Computes indicators for a series and returns its latest complete row.
///
/// Fails with `InsufficientData` when the series is shorter than
/// `MIN_ANALYSIS_BARS` or no row is fully defined.
pub fn analyze_series(series: &BarSeries) -> Result<CompleteRow, NewstraderError> {
    let insufficient = || NewstraderError::InsufficientData {
        symbol: series.symbol().to_string(),
        bars: series.len(),
        minimum: MIN_ANALYSIS_BARS,
    };

    if series.len() < MIN_ANALYSIS_BARS {
        return Err(insufficient());
    }
    let rows = compute_rows(series.bars());
    latest_complete_row(&rows).ok_or_else(insufficient)
}
