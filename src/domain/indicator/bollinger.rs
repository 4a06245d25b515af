//! Bollinger Bands: SMA middle band ± k standard deviations.
//!
//! The middle band uses the shrinking-window SMA and is always present; the
//! envelope needs a sample deviation, so upper/lower are `None` until the
//! window holds two closes.

use crate::domain::indicator::rolling::{rolling_std, sma};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: Option<f64>,
    pub middle: f64,
    pub lower: Option<f64>,
}

pub fn bollinger(closes: &[f64], period: usize, std_mult: f64) -> Vec<BollingerPoint> {
    let middle = sma(closes, period);
    let std = rolling_std(closes, period);

    middle
        .iter()
        .zip(std.iter())
        .map(|(&middle, &std)| BollingerPoint {
            upper: std.map(|s| middle + std_mult * s),
            middle,
            lower: std.map(|s| middle - std_mult * s),
        })
        .collect()
}
