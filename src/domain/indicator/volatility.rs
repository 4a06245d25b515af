//! Annualized historical volatility.
//!
//! Rolling sample standard deviation of daily percentage returns over the
//! window, scaled by √252. Needs two returns (three closes) before a value
//! exists; no zero substitution for missing history.

use crate::domain::indicator::rolling::{pct_returns, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn annualized_volatility(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    assert!(window > 0, "window must be positive");
    let returns = pct_returns(closes);

    let mut out = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let start = (i + 1).saturating_sub(window);
        let window_returns: Vec<f64> = returns[start..=i].iter().filter_map(|r| *r).collect();
        out.push(sample_std(&window_returns).map(|s| s * TRADING_DAYS_PER_YEAR.sqrt()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn undefined_until_two_returns() {
        let out = annualized_volatility(&[100.0, 101.0, 102.0], 30);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!(out[2].is_some());
    }

    #[test]
    fn constant_returns_have_zero_volatility() {
        // 1% up every day: all returns equal, deviation zero.
        let closes: Vec<f64> = (0..10).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let out = annualized_volatility(&closes, 30);
        assert_relative_eq!(out.last().unwrap().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn scales_by_sqrt_252() {
        let closes = [100.0, 102.0, 100.0, 102.0, 100.0];
        let out = annualized_volatility(&closes, 30);
        let returns: Vec<f64> = (1..closes.len())
            .map(|i| (closes[i] - closes[i - 1]) / closes[i - 1])
            .collect();
        let expected = sample_std(&returns).unwrap() * 252.0f64.sqrt();
        assert_relative_eq!(out.last().unwrap().unwrap(), expected, epsilon = 1e-12);
    }
}
