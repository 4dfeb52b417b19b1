//! OHLCV bar representation and validated bar series.

use crate::domain::error::NewstraderError;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Bars for one instrument at one timeframe, oldest first.
///
/// Construction checks that timestamps strictly increase and every price is
/// finite. Gaps between bars are allowed.
#[derive(Debug, Clone)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, NewstraderError> {
        let symbol = symbol.into();
        if let Some(bar) = bars.iter().find(|bar| !bar.is_finite()) {
            return Err(NewstraderError::InvalidBars {
                symbol,
                reason: format!("non-finite price in bar at {}", bar.timestamp),
            });
        }
        if let Some(pair) = bars
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(NewstraderError::InvalidBars {
                symbol,
                reason: format!(
                    "timestamp {} does not follow {}",
                    pair[1].timestamp, pair[0].timestamp
                ),
            });
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
