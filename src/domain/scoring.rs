//! Composite signal scoring.
//!
//! Five sub-scores, each a piecewise mapping from a raw metric onto 0..100,
//! blended with normalized weights into a total score and a category. A
//! missing metric scores neutral (50) rather than dragging the blend down.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "EXCELLENT",
            ScoreCategory::Good => "GOOD",
            ScoreCategory::Fair => "FAIR",
            ScoreCategory::Poor => "POOR",
            ScoreCategory::VeryPoor => "VERY_POOR",
        }
    }

    pub fn from_score(score: f64) -> ScoreCategory {
        if score >= 80.0 {
            ScoreCategory::Excellent
        } else if score >= 60.0 {
            ScoreCategory::Good
        } else if score >= 40.0 {
            ScoreCategory::Fair
        } else if score >= 20.0 {
            ScoreCategory::Poor
        } else {
            ScoreCategory::VeryPoor
        }
    }
}

/// Raw metrics feeding the scorer. Absent metrics are skipped.
///
/// `volatility_pct` is a daily percentage figure, not the annualized
/// fraction the indicator engine stores.
#[derive(Debug, Clone, Default)]
pub struct ScoreInputs {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub current_price: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub volume_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalScore {
    pub total_score: f64,
    pub category: ScoreCategory,
    pub technical_score: f64,
    pub momentum_score: f64,
    pub volatility_score: f64,
    pub trend_score: f64,
    pub volume_score: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub technical: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub trend: f64,
    pub volume: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            technical: 0.30,
            momentum: 0.25,
            volatility: 0.20,
            trend: 0.15,
            volume: 0.10,
        }
    }
}

pub struct SignalScorer {
    weights: ScoreWeights,
}

impl SignalScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        // Normalize so callers may pass any positive proportions.
        let total = weights.technical
            + weights.momentum
            + weights.volatility
            + weights.trend
            + weights.volume;
        Self {
            weights: ScoreWeights {
                technical: weights.technical / total,
                momentum: weights.momentum / total,
                volatility: weights.volatility / total,
                trend: weights.trend / total,
                volume: weights.volume / total,
            },
        }
    }

    pub fn score(&self, inputs: &ScoreInputs) -> SignalScore {
        let technical = score_technical(inputs);
        let momentum = score_momentum(inputs);
        let volatility = score_volatility(inputs);
        let trend = score_trend(inputs);
        let volume = score_volume(inputs);

        let total = technical * self.weights.technical
            + momentum * self.weights.momentum
            + volatility * self.weights.volatility
            + trend * self.weights.trend
            + volume * self.weights.volume;

        SignalScore {
            total_score: total,
            category: ScoreCategory::from_score(total),
            technical_score: technical,
            momentum_score: momentum,
            volatility_score: volatility,
            trend_score: trend,
            volume_score: volume,
        }
    }
}

impl Default for SignalScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

fn score_technical(inputs: &ScoreInputs) -> f64 {
    let mut scores = Vec::new();

    if let Some(rsi) = inputs.rsi {
        // Neutral-to-slightly-bullish RSI scores best.
        let s = if (40.0..=60.0).contains(&rsi) {
            100.0
        } else if (30.0..40.0).contains(&rsi) || (60.0..=70.0).contains(&rsi) {
            80.0
        } else if (20.0..30.0).contains(&rsi) || (70.0..=80.0).contains(&rsi) {
            60.0
        } else if rsi < 20.0 {
            40.0
        } else {
            20.0
        };
        scores.push(s);
    }

    if let (Some(macd), Some(signal)) = (inputs.macd, inputs.macd_signal) {
        let diff = macd - signal;
        let s = if diff > 0.0 && macd > 0.0 {
            100.0
        } else if diff > 0.0 {
            80.0
        } else if diff < 0.0 && macd < 0.0 {
            20.0
        } else if diff < 0.0 {
            40.0
        } else {
            60.0
        };
        scores.push(s);
    }

    average_or_neutral(&scores)
}

fn score_momentum(inputs: &ScoreInputs) -> f64 {
    let mut scores = Vec::new();

    if let Some(change) = inputs.price_change_pct {
        // Positive momentum scores well, extreme moves are penalized.
        let s = if (2.0..=5.0).contains(&change) {
            100.0
        } else if (5.0..=10.0).contains(&change) {
            80.0
        } else if (0.0..2.0).contains(&change) {
            70.0
        } else if (10.0..=15.0).contains(&change) {
            60.0
        } else if change > 15.0 {
            40.0
        } else if (-2.0..0.0).contains(&change) {
            50.0
        } else if (-5.0..-2.0).contains(&change) {
            30.0
        } else {
            20.0
        };
        scores.push(s);
    }

    if let (Some(price), Some(ma)) = (inputs.current_price, inputs.ma_short) {
        if ma > 0.0 {
            let above_pct = (price - ma) / ma * 100.0;
            let s = if above_pct > 0.0 {
                (70.0 + above_pct * 3.0).min(100.0)
            } else {
                (50.0 + above_pct * 2.0).max(20.0)
            };
            scores.push(s);
        }
    }

    average_or_neutral(&scores)
}

fn score_volatility(inputs: &ScoreInputs) -> f64 {
    let Some(vol) = inputs.volatility_pct else {
        return 50.0;
    };
    if vol < 2.0 {
        100.0
    } else if vol < 3.0 {
        85.0
    } else if vol < 4.0 {
        70.0
    } else if vol < 5.0 {
        55.0
    } else if vol < 7.0 {
        40.0
    } else {
        20.0
    }
}

fn score_trend(inputs: &ScoreInputs) -> f64 {
    let mut scores = Vec::new();

    if let (Some(short), Some(long)) = (inputs.ma_short, inputs.ma_long) {
        if long > 0.0 {
            let diff_pct = (short - long) / long * 100.0;
            let s = if diff_pct > 5.0 {
                100.0
            } else if diff_pct > 2.0 {
                85.0
            } else if diff_pct > 0.0 {
                70.0
            } else if diff_pct > -2.0 {
                50.0
            } else if diff_pct > -5.0 {
                35.0
            } else {
                20.0
            };
            scores.push(s);
        }
    }

    if let (Some(price), Some(short), Some(long)) =
        (inputs.current_price, inputs.ma_short, inputs.ma_long)
    {
        let s = if price > short && short > long {
            100.0
        } else if price > short || price > long {
            70.0
        } else if price < short && short < long {
            20.0
        } else {
            40.0
        };
        scores.push(s);
    }

    average_or_neutral(&scores)
}

fn score_volume(inputs: &ScoreInputs) -> f64 {
    let Some(ratio) = inputs.volume_ratio else {
        return 50.0;
    };
    let rising = inputs.price_change_pct.unwrap_or(0.0) > 0.0;

    if rising {
        if ratio > 2.0 {
            100.0
        } else if ratio > 1.5 {
            85.0
        } else if ratio > 1.0 {
            70.0
        } else {
            50.0
        }
    } else if ratio > 2.0 {
        30.0
    } else if ratio > 1.5 {
        40.0
    } else if ratio > 1.0 {
        55.0
    } else {
        70.0
    }
}

fn average_or_neutral(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        50.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strong_inputs() -> ScoreInputs {
        ScoreInputs {
            rsi: Some(55.0),
            macd: Some(1.2),
            macd_signal: Some(0.8),
            ma_short: Some(102.0),
            ma_long: Some(95.0),
            current_price: Some(105.0),
            price_change_pct: Some(3.0),
            volatility_pct: Some(1.5),
            volume_ratio: Some(2.5),
        }
    }

    #[test]
    fn strong_setup_scores_excellent() {
        let score = SignalScorer::default().score(&strong_inputs());
        assert!(score.total_score >= 80.0, "got {}", score.total_score);
        assert_eq!(score.category, ScoreCategory::Excellent);
    }

    #[test]
    fn weak_setup_scores_poorly() {
        let inputs = ScoreInputs {
            rsi: Some(85.0),
            macd: Some(-1.5),
            macd_signal: Some(-1.0),
            ma_short: Some(90.0),
            ma_long: Some(100.0),
            current_price: Some(85.0),
            price_change_pct: Some(-8.0),
            volatility_pct: Some(9.0),
            volume_ratio: Some(2.5),
        };
        let score = SignalScorer::default().score(&inputs);
        assert!(score.total_score < 40.0, "got {}", score.total_score);
    }

    #[test]
    fn empty_inputs_are_neutral() {
        let score = SignalScorer::default().score(&ScoreInputs::default());
        assert_relative_eq!(score.total_score, 50.0, epsilon = 1e-9);
        assert_eq!(score.category, ScoreCategory::Fair);
    }

    #[test]
    fn weights_are_normalized() {
        let doubled = ScoreWeights {
            technical: 0.60,
            momentum: 0.50,
            volatility: 0.40,
            trend: 0.30,
            volume: 0.20,
        };
        let a = SignalScorer::default().score(&strong_inputs());
        let b = SignalScorer::new(doubled).score(&strong_inputs());
        assert_relative_eq!(a.total_score, b.total_score, epsilon = 1e-9);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(ScoreCategory::from_score(80.0), ScoreCategory::Excellent);
        assert_eq!(ScoreCategory::from_score(79.9), ScoreCategory::Good);
        assert_eq!(ScoreCategory::from_score(60.0), ScoreCategory::Good);
        assert_eq!(ScoreCategory::from_score(40.0), ScoreCategory::Fair);
        assert_eq!(ScoreCategory::from_score(20.0), ScoreCategory::Poor);
        assert_eq!(ScoreCategory::from_score(19.9), ScoreCategory::VeryPoor);
    }

    #[test]
    fn neutral_rsi_band_scores_full() {
        let inputs = ScoreInputs {
            rsi: Some(50.0),
            ..ScoreInputs::default()
        };
        let score = SignalScorer::default().score(&inputs);
        assert_relative_eq!(score.technical_score, 100.0);
    }
}
