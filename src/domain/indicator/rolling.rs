//! Rolling-window primitives shared by the indicator calculations.
//!
//! Windows shrink to the available history: at index i the window covers the
//! last min(i+1, window) samples, so every output
//! index has a value as soon as its inputs exist. Standard deviation is the
//! sample deviation (ddof = 1) and is undefined for a single observation.

/// Simple moving average with a shrinking leading window.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window > 0, "window must be positive");
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(sum / n as f64);
    }
    out
}

/// Rolling sample standard deviation; `None` until the window holds at least
/// two samples.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    assert!(window > 0, "window must be positive");
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        out.push(sample_std(slice));
    }
    out
}

/// Sample standard deviation of a slice; `None` for fewer than two samples.
pub fn sample_std(slice: &[f64]) -> Option<f64> {
    let n = slice.len();
    if n < 2 {
        return None;
    }
    let mean = slice.iter().sum::<f64>() / n as f64;
    let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

/// Exponential moving average seeded from the first value.
///
/// k = 2/(span+1); ema[0] = x[0]; ema[i] = x[i]*k + ema[i-1]*(1-k).
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    assert!(span > 0, "span must be positive");
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = 0.0;
    for (i, &v) in values.iter().enumerate() {
        prev = if i == 0 { v } else { v * k + prev * (1.0 - k) };
        out.push(prev);
    }
    out
}

/// Daily percentage returns; `None` at index 0.
pub fn pct_returns(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(None);
        } else {
            out.push(Some((values[i] - values[i - 1]) / values[i - 1]));
        }
    }
    out
}
