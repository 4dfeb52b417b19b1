//! Market state classification from the latest complete indicator row.
//!
//! Trend is the mean of three votes (SMA20 vs SMA50, RSI vs 50, MACD vs
//! signal). Each vote is +1 when the first value is higher, -1 when lower and
//! 0 on a tie. Mean above 0.3 is bullish, below -0.3 bearish.
//!
//! Trend strength is `tanh((SMA20 - SMA50) / ATR)` and volatility is
//! `ATR / close`.

use crate::domain::direction::Direction;
use crate::domain::indicator_helpers::CompleteRow;
use std::fmt;

pub const TREND_THRESHOLD: f64 = 0.3;
pub const RSI_MIDLINE: f64 = 50.0;

/// Relative tolerance under which two indicator values count as tied.
const TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    pub fn direction(self) -> Direction {
        match self {
            Trend::Bullish => Direction::Buy,
            Trend::Bearish => Direction::Sell,
            Trend::Neutral => Direction::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdSignal {
    Buy,
    Sell,
}

impl MacdSignal {
    pub fn direction(self) -> Direction {
        match self {
            MacdSignal::Buy => Direction::Buy,
            MacdSignal::Sell => Direction::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    AboveUpper,
    BelowLower,
    Inside,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    pub trend: Trend,
    /// In [-1, 1]; sign follows the SMA spread.
    pub trend_strength: f64,
    pub rsi: f64,
    pub macd_signal: MacdSignal,
    pub band_position: BandPosition,
    pub atr: f64,
    pub volatility: f64,
    pub close: f64,
}

pub fn classify(row: &CompleteRow) -> MarketState {
    MarketState {
        trend: classify_trend(row),
        trend_strength: trend_strength(row.sma20, row.sma50, row.atr14),
        rsi: row.rsi14,
        macd_signal: macd_signal(row.macd, row.macd_signal),
        band_position: band_position(row.close, row.upper_band, row.lower_band),
        atr: row.atr14,
        volatility: volatility(row.atr14, row.close),
        close: row.close,
    }
}

pub fn classify_trend(row: &CompleteRow) -> Trend {
    let votes = vote(row.sma20, row.sma50)
        + vote(row.rsi14, RSI_MIDLINE)
        + vote(row.macd, row.macd_signal);
    let score = votes / 3.0;
    if score > TREND_THRESHOLD {
        Trend::Bullish
    } else if score < -TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Strict: equal values are a sell.
pub fn macd_signal(macd: f64, signal: f64) -> MacdSignal {
    if macd > signal {
        MacdSignal::Buy
    } else {
        MacdSignal::Sell
    }
}

pub fn band_position(price: f64, upper: f64, lower: f64) -> BandPosition {
    if price > upper {
        BandPosition::AboveUpper
    } else if price < lower {
        BandPosition::BelowLower
    } else {
        BandPosition::Inside
    }
}

pub fn trend_strength(sma_fast: f64, sma_slow: f64, atr: f64) -> f64 {
    let spread = sma_fast - sma_slow;
    if atr > 0.0 {
        (spread / atr).tanh()
    } else {
        vote(sma_fast, sma_slow)
    }
}

pub fn volatility(atr: f64, price: f64) -> f64 {
    if price > 0.0 { atr / price } else { 0.0 }
}

fn vote(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs()).max(1.0);
    if (a - b).abs() <= TIE_TOLERANCE * scale {
        0.0
    } else if a > b {
        1.0
    } else {
        -1.0
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
            Trend::Neutral => write!(f, "Neutral"),
        }
    }
}

impl fmt::Display for MacdSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.direction())
    }
}

impl fmt::Display for BandPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandPosition::AboveUpper => write!(f, "ABOVE_UPPER"),
            BandPosition::BelowLower => write!(f, "BELOW_LOWER"),
            BandPosition::Inside => write!(f, "INSIDE"),
        }
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trend={} strength={:.3} rsi={:.1} macd={} band={} atr={:.5} vol={:.4}",
            self.trend,
            self.trend_strength,
            self.rsi,
            self.macd_signal,
            self.band_position,
            self.atr,
            self.volatility
        )
    }
}
