//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! All EMAs are seeded with their first input, so every bar is defined.

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);

    let values = bars
        .iter()
        .zip(macd_line.iter().zip(&signal_line))
        .map(|(bar, (&line, &signal))| IndicatorPoint {
            timestamp: bar.timestamp,
            value: Some(IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            }),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    fn default_macd(bars: &[OhlcvBar]) -> IndicatorSeries {
        calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }

    fn line_and_signal(point: &IndicatorPoint) -> (f64, f64) {
        match point.value {
            Some(IndicatorValue::Macd { line, signal, .. }) => (line, signal),
            other => panic!("Expected MACD value, got {:?}", other),
        }
    }

    #[test]
    fn macd_defined_from_first_bar() {
        let series = default_macd(&make_bars(&[100.0, 101.0, 102.0]));
        assert!(series.values.iter().all(|p| p.is_defined()));
        assert_eq!(line_and_signal(&series.values[0]), (0.0, 0.0));
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let series = default_macd(&make_bars(&prices));

        for point in &series.values {
            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = point.value
            {
                assert!((histogram - (line - signal)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let prices = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        let series = calculate_macd(&make_bars(&prices), 3, 5, 2);

        let ema_fast = ema_values(&prices, 3);
        let ema_slow = ema_values(&prices, 5);

        for (i, point) in series.values.iter().enumerate() {
            let (line, _) = line_and_signal(point);
            assert_relative_eq!(line, ema_fast[i] - ema_slow[i]);
        }
    }

    #[test]
    fn macd_signal_is_ema_of_line() {
        let prices: Vec<f64> = (0..30).map(|i| 50.0 + (i % 7) as f64).collect();
        let series = default_macd(&make_bars(&prices));
        let lines: Vec<f64> = series.values.iter().map(|p| line_and_signal(p).0).collect();
        let expected = ema_values(&lines, DEFAULT_SIGNAL);

        for (point, want) in series.values.iter().zip(expected) {
            assert_relative_eq!(line_and_signal(point).1, want);
        }
    }

    #[test]
    fn macd_rising_prices_cross_above_signal() {
        let prices: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.5).collect();
        let series = default_macd(&make_bars(&prices));
        let (line, signal) = line_and_signal(series.values.last().unwrap());
        assert!(line > signal, "line {} should exceed signal {}", line, signal);
    }

    #[test]
    fn macd_constant_prices_are_flat() {
        let series = default_macd(&make_bars(&[1.1; 60]));
        for point in &series.values {
            assert_eq!(line_and_signal(point), (0.0, 0.0));
        }
    }

    #[test]
    fn macd_empty_bars() {
        assert!(default_macd(&[]).values.is_empty());
    }

    #[test]
    fn macd_zero_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        assert!(calculate_macd(&bars, 0, 26, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 0, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 26, 0).values.is_empty());
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&make_bars(&[100.0]), 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }
}
