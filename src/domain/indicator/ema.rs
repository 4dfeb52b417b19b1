//! Exponential Moving Average.
//!
//! α = 2/(n+1), seeded with the first sample, then
//! EMA[i] = EMA[i-1] + α·(x[i] - EMA[i-1]). No bias adjustment is applied,
//! so every sample is defined. MACD builds its lines from this.

/// EMA over raw samples. Written in incremental form so a constant input
/// stays exactly constant.
pub fn ema_values(samples: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(samples.len());
    let mut ema = match samples.first() {
        Some(&first) => first,
        None => return out,
    };

    for &x in samples {
        ema += alpha * (x - ema);
        out.push(ema);
    }
    out
}
