//! RSI (Relative Strength Index), rolling-mean variant.
//!
//! Average gain and loss are plain rolling means of the positive/negative
//! daily deltas over the period (shrinking window, first delta treated as
//! zero). RS = avg_gain / avg_loss; avg_loss = 0 with any gain means RS → ∞,
//! i.e. RSI = 100. With no deltas at all the RSI defaults to neutral 50,
//! which also guards the divide-by-zero.

use crate::domain::indicator::rolling::sma;

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    assert!(period > 0, "period must be positive");
    if closes.is_empty() {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gain = sma(&gains, period);
    let avg_loss = sma(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&gain, &loss)| {
            if loss == 0.0 {
                if gain == 0.0 { 50.0 } else { 100.0 }
            } else {
                100.0 - 100.0 / (1.0 + gain / loss)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_sample_is_neutral() {
        let out = rsi(&[100.0], 14);
        assert_relative_eq!(out[0], 50.0);
    }

    #[test]
    fn flat_series_stays_neutral() {
        let out = rsi(&[100.0; 10], 14);
        assert!(out.iter().all(|&v| v == 50.0));
    }

    #[test]
    fn pure_uptrend_saturates_at_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_relative_eq!(*out.last().unwrap(), 100.0);
    }

    #[test]
    fn pure_downtrend_reaches_0() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        assert_relative_eq!(*out.last().unwrap(), 0.0);
    }

    #[test]
    fn uptrend_stays_above_50() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64) * 0.5).collect();
        let out = rsi(&closes, 14);
        assert!(*out.last().unwrap() > 50.0);
    }

    #[test]
    fn always_in_range() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i * 37) % 11) as f64 - 5.0)
            .collect();
        for v in rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
