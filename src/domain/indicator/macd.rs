//! MACD (Moving Average Convergence Divergence).
//!
//! Line = EMA(fast) − EMA(slow); signal = EMA(signal_span) of the line;
//! histogram = line − signal. EMAs seed from the first value, so every index
//! has an output (early values simply carry little smoothing history).

use crate::domain::indicator::rolling::ema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> Vec<MacdPoint> {
    if closes.is_empty() {
        return Vec::new();
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&line, signal_span);

    line.iter()
        .zip(signal.iter())
        .map(|(&line, &signal)| MacdPoint {
            line,
            signal,
            histogram: line - signal,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_point_is_zero() {
        let out = macd(&[100.0, 101.0, 102.0], 12, 26, 9);
        // Both EMAs seed at the first close, so the line starts at zero.
        assert_relative_eq!(out[0].line, 0.0);
        assert_relative_eq!(out[0].histogram, 0.0);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        for point in macd(&closes, 12, 26, 9) {
            assert_relative_eq!(
                point.histogram,
                point.line - point.signal,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn uptrend_gives_positive_line() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let out = macd(&closes, 12, 26, 9);
        // Fast EMA tracks a rising series more closely than the slow EMA.
        assert!(out.last().unwrap().line > 0.0);
    }

    #[test]
    fn flat_series_is_all_zero() {
        let out = macd(&[50.0; 30], 12, 26, 9);
        for point in out {
            assert_relative_eq!(point.line, 0.0);
            assert_relative_eq!(point.signal, 0.0);
        }
    }
}
