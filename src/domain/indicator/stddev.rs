//! Rolling sample standard deviation, used by the Bollinger bands.
//!
//! STDDEV(n)[i] = sqrt(sum((x[i-j] - mean)^2 for j in 0..n) / (n-1))
//! Warmup: first (n-1) samples are undefined. A period of 1 has no
//! dispersion estimate and is undefined everywhere.

pub(crate) fn rolling_stddev(samples: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..samples.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window = &samples[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|x| {
                    let diff = x - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (period - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}
