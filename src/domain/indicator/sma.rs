//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = bars
        .iter()
        .zip(rolling_mean(&closes, period))
        .map(|(bar, mean)| IndicatorPoint {
            timestamp: bar.timestamp,
            value: mean.map(IndicatorValue::Simple),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

/// Trailing mean over `period` samples, `None` until the window is full.
///
/// Each window is summed afresh: equal windows give bit-identical means.
pub(crate) fn rolling_mean(samples: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; samples.len()];
    }
    (0..samples.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &samples[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
