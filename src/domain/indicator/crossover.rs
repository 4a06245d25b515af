//! Edge-triggered moving-average crossover detection.
//!
//! A signal fires only at the index where the short/long relationship flips:
//! ≤ to > emits Bullish (golden cross), ≥ to < emits Bearish (death cross).
//! A series that stays on one side after crossing emits the signal exactly
//! once, at the crossing index.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverSignal {
    Bullish,
    Bearish,
}

impl CrossoverSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossoverSignal::Bullish => "BULLISH",
            CrossoverSignal::Bearish => "BEARISH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BULLISH" => Some(CrossoverSignal::Bullish),
            "BEARISH" => Some(CrossoverSignal::Bearish),
            _ => None,
        }
    }
}

pub fn detect_crossovers(short: &[f64], long: &[f64]) -> Vec<Option<CrossoverSignal>> {
    assert_eq!(short.len(), long.len(), "series length mismatch");
    let mut out = vec![None; short.len()];

    for i in 1..short.len() {
        let prev_short = short[i - 1];
        let prev_long = long[i - 1];
        if prev_short <= prev_long && short[i] > long[i] {
            out[i] = Some(CrossoverSignal::Bullish);
        } else if prev_short >= prev_long && short[i] < long[i] {
            out[i] = Some(CrossoverSignal::Bearish);
        }
    }

    out
}
