//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation over the same window.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::stddev::rolling_stddev;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    if period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middles = rolling_mean(&closes, period);
    let stddevs = rolling_stddev(&closes, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = match (middles[i], stddevs[i]) {
                (Some(middle), Some(sd)) => Some(IndicatorValue::Bollinger {
                    upper: middle + mult * sd,
                    middle,
                    lower: middle - mult * sd,
                }),
                _ => None,
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            }
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

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => (upper, middle, lower),
            other => panic!("Expected Bollinger value, got {:?}", other),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3, 200);

        assert!(!series.values[0].is_defined());
        assert!(!series.values[1].is_defined());
        assert!(series.values[2].is_defined());
        assert!(series.values[4].is_defined());
    }

    #[test]
    fn bollinger_constant_values() {
        let series = calculate_bollinger(&make_bars(&[100.0; 5]), 3, 200);
        let (upper, middle, lower) = bands(&series, 2);
        assert_relative_eq!(middle, 100.0);
        assert_relative_eq!(upper, 100.0);
        assert_relative_eq!(lower, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 3, 200);
        let (upper, middle, lower) = bands(&series, 2);

        // sample stddev of [10, 20, 30] is 10
        assert_relative_eq!(middle, 20.0, epsilon = 1e-10);
        assert_relative_eq!(upper, 40.0, epsilon = 1e-10);
        assert_relative_eq!(lower, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 3, 100);
        let (upper, middle, lower) = bands(&series, 2);
        assert_relative_eq!(upper - middle, 10.0, epsilon = 1e-10);
        assert_relative_eq!(middle - lower, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_indicator_type() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 20, 200);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
        assert!(series.values.iter().all(|p| !p.is_defined()));
    }
}
