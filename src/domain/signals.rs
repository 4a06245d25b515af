//! Buy/sell/hold signal generation.
//!
//! Each indicator casts a weighted vote for one signal kind; votes are
//! normalized per kind and the heaviest kind wins. When buy-side and
//! sell-side weight both exceed 0.3 the signals conflict and confidence is
//! dampened by 0.6. Confidence is always clamped to [0.1, 0.95].

use crate::domain::scoring::ScoreInputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::StrongBuy => "STRONG_BUY",
            SignalKind::Buy => "BUY",
            SignalKind::Hold => "HOLD",
            SignalKind::Sell => "SELL",
            SignalKind::StrongSell => "STRONG_SELL",
        }
    }

    pub fn parse(s: &str) -> Option<SignalKind> {
        match s.trim().to_uppercase().as_str() {
            "STRONG_BUY" => Some(SignalKind::StrongBuy),
            "BUY" => Some(SignalKind::Buy),
            "HOLD" => Some(SignalKind::Hold),
            "SELL" => Some(SignalKind::Sell),
            "STRONG_SELL" => Some(SignalKind::StrongSell),
            _ => None,
        }
    }

    pub fn is_buy_side(&self) -> bool {
        matches!(self, SignalKind::StrongBuy | SignalKind::Buy)
    }

    pub fn is_sell_side(&self) -> bool {
        matches!(self, SignalKind::StrongSell | SignalKind::Sell)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSignal {
    pub kind: SignalKind,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

/// RSI band thresholds for signal votes.
#[derive(Debug, Clone)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_strong_oversold: f64,
    pub rsi_strong_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_strong_oversold: 20.0,
            rsi_strong_overbought: 80.0,
        }
    }
}

struct Vote {
    kind: SignalKind,
    weight: f64,
}

pub struct SignalGenerator {
    thresholds: SignalThresholds,
}

impl SignalGenerator {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn generate(&self, inputs: &ScoreInputs) -> TechnicalSignal {
        let mut votes = Vec::new();
        let mut reasons = Vec::new();

        if let Some(vote) = self.rsi_vote(inputs.rsi) {
            if let Some(rsi) = inputs.rsi {
                match vote.kind {
                    SignalKind::StrongBuy => {
                        reasons.push(format!("RSI {rsi:.1} strongly oversold"));
                    }
                    SignalKind::Buy => reasons.push(format!("RSI {rsi:.1} oversold")),
                    SignalKind::StrongSell => {
                        reasons.push(format!("RSI {rsi:.1} strongly overbought"));
                    }
                    SignalKind::Sell => reasons.push(format!("RSI {rsi:.1} overbought")),
                    SignalKind::Hold => {}
                }
            }
            votes.push(vote);
        }

        if let Some(vote) = macd_vote(inputs.macd, inputs.macd_signal) {
            let macd = inputs.macd.unwrap_or(0.0);
            if vote.kind.is_buy_side() {
                reasons.push(format!("MACD above signal line ({macd:.2})"));
            } else if vote.kind.is_sell_side() {
                reasons.push(format!("MACD below signal line ({macd:.2})"));
            }
            votes.push(vote);
        }

        if let Some(vote) =
            moving_average_vote(inputs.current_price, inputs.ma_short, inputs.ma_long)
        {
            let price = inputs.current_price.unwrap_or(0.0);
            let short = inputs.ma_short.unwrap_or(0.0);
            let long = inputs.ma_long.unwrap_or(0.0);
            match vote.kind {
                SignalKind::StrongBuy => reasons.push(format!(
                    "golden cross, short MA {short:.2} above long MA {long:.2}"
                )),
                SignalKind::Buy => {
                    reasons.push(format!("price {price:.2} above short MA {short:.2}"));
                }
                SignalKind::StrongSell => reasons.push(format!(
                    "death cross, short MA {short:.2} below long MA {long:.2}"
                )),
                SignalKind::Sell => {
                    reasons.push(format!("price {price:.2} below short MA {short:.2}"));
                }
                SignalKind::Hold => {}
            }
            votes.push(vote);
        }

        if let Some(vote) = volume_vote(inputs.volume_ratio) {
            if vote.kind.is_buy_side() {
                let ratio = inputs.volume_ratio.unwrap_or(1.0);
                reasons.push(format!("volume support at {ratio:.1}x average"));
            }
            votes.push(vote);
        }

        if votes.is_empty() {
            return TechnicalSignal {
                kind: SignalKind::Hold,
                confidence: 0.5,
                reasons: vec!["insufficient indicator data".to_string()],
            };
        }

        let (kind, confidence) = aggregate(&votes);
        if reasons.is_empty() {
            reasons.push("mixed signals".to_string());
        }
        TechnicalSignal {
            kind,
            confidence,
            reasons,
        }
    }

    fn rsi_vote(&self, rsi: Option<f64>) -> Option<Vote> {
        let rsi = rsi?;
        let t = &self.thresholds;
        let vote = if rsi <= t.rsi_strong_oversold {
            Vote {
                kind: SignalKind::StrongBuy,
                weight: 1.5,
            }
        } else if rsi <= t.rsi_oversold {
            Vote {
                kind: SignalKind::Buy,
                weight: 1.0,
            }
        } else if rsi >= t.rsi_strong_overbought {
            Vote {
                kind: SignalKind::StrongSell,
                weight: 1.5,
            }
        } else if rsi >= t.rsi_overbought {
            Vote {
                kind: SignalKind::Sell,
                weight: 1.0,
            }
        } else {
            Vote {
                kind: SignalKind::Hold,
                weight: 0.5,
            }
        };
        Some(vote)
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(SignalThresholds::default())
    }
}

fn macd_vote(macd: Option<f64>, signal: Option<f64>) -> Option<Vote> {
    let (macd, signal) = (macd?, signal?);
    let diff = macd - signal;
    let vote = if diff > 0.0 && macd > 0.0 {
        Vote {
            kind: SignalKind::StrongBuy,
            weight: 1.2,
        }
    } else if diff > 0.0 {
        Vote {
            kind: SignalKind::Buy,
            weight: 0.8,
        }
    } else if diff < 0.0 && macd < 0.0 {
        Vote {
            kind: SignalKind::StrongSell,
            weight: 1.2,
        }
    } else if diff < 0.0 {
        Vote {
            kind: SignalKind::Sell,
            weight: 0.8,
        }
    } else {
        Vote {
            kind: SignalKind::Hold,
            weight: 0.3,
        }
    };
    Some(vote)
}

fn moving_average_vote(
    price: Option<f64>,
    ma_short: Option<f64>,
    ma_long: Option<f64>,
) -> Option<Vote> {
    let price = price?;
    let mut candidates: Vec<Vote> = Vec::new();

    if let (Some(short), Some(long)) = (ma_short, ma_long) {
        if short > long {
            candidates.push(Vote {
                kind: SignalKind::StrongBuy,
                weight: 1.3,
            });
        } else if short < long {
            candidates.push(Vote {
                kind: SignalKind::StrongSell,
                weight: 1.3,
            });
        }
    }

    if let Some(short) = ma_short {
        if short > 0.0 {
            let diff_pct = (price - short) / short * 100.0;
            if diff_pct > 5.0 {
                candidates.push(Vote {
                    kind: SignalKind::Buy,
                    weight: 0.7,
                });
            } else if diff_pct < -5.0 {
                candidates.push(Vote {
                    kind: SignalKind::Sell,
                    weight: 0.7,
                });
            }
        }
    }

    // Only the strongest moving-average opinion counts.
    let strongest = candidates
        .into_iter()
        .max_by(|a, b| a.weight.total_cmp(&b.weight));
    Some(strongest.unwrap_or(Vote {
        kind: SignalKind::Hold,
        weight: 0.5,
    }))
}

fn volume_vote(volume_ratio: Option<f64>) -> Option<Vote> {
    let ratio = volume_ratio?;
    if ratio > 2.0 {
        Some(Vote {
            kind: SignalKind::Buy,
            weight: 0.6,
        })
    } else if ratio > 1.5 {
        Some(Vote {
            kind: SignalKind::Buy,
            weight: 0.4,
        })
    } else if ratio < 0.5 {
        Some(Vote {
            kind: SignalKind::Hold,
            weight: 0.2,
        })
    } else {
        None
    }
}

fn aggregate(votes: &[Vote]) -> (SignalKind, f64) {
    let kinds = [
        SignalKind::StrongBuy,
        SignalKind::Buy,
        SignalKind::Hold,
        SignalKind::Sell,
        SignalKind::StrongSell,
    ];
    let mut weights = [0.0f64; 5];
    let mut total = 0.0;
    for vote in votes {
        let idx = kinds
            .iter()
            .position(|k| *k == vote.kind)
            .unwrap_or(2);
        weights[idx] += vote.weight;
        total += vote.weight;
    }
    if total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
    }

    let (mut winner, mut confidence) = kinds
        .iter()
        .zip(weights.iter())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(k, w)| (*k, *w))
        .unwrap_or((SignalKind::Hold, 0.5));

    let buy_weight = weights[0] + weights[1];
    let sell_weight = weights[3] + weights[4];
    let hold_weight = weights[2];

    if buy_weight > 0.3 && sell_weight > 0.3 {
        confidence *= 0.6;
    } else if hold_weight > 0.5 {
        winner = SignalKind::Hold;
        confidence = hold_weight;
    }

    (winner, confidence.clamp(0.1, 0.95))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullish_inputs() -> ScoreInputs {
        ScoreInputs {
            rsi: Some(18.0),
            macd: Some(0.9),
            macd_signal: Some(0.4),
            ma_short: Some(105.0),
            ma_long: Some(98.0),
            current_price: Some(112.0),
            volume_ratio: Some(2.4),
            ..ScoreInputs::default()
        }
    }

    #[test]
    fn aligned_bullish_votes_yield_strong_buy() {
        let signal = SignalGenerator::default().generate(&bullish_inputs());
        assert_eq!(signal.kind, SignalKind::StrongBuy);
        assert!(signal.confidence > 0.5);
        assert!(!signal.reasons.is_empty());
    }

    #[test]
    fn aligned_bearish_votes_yield_strong_sell() {
        let inputs = ScoreInputs {
            rsi: Some(85.0),
            macd: Some(-0.9),
            macd_signal: Some(-0.4),
            ma_short: Some(92.0),
            ma_long: Some(101.0),
            current_price: Some(85.0),
            ..ScoreInputs::default()
        };
        let signal = SignalGenerator::default().generate(&inputs);
        assert_eq!(signal.kind, SignalKind::StrongSell);
    }

    #[test]
    fn conflicting_votes_dampen_confidence() {
        // Oversold RSI votes buy while MACD and MAs vote sell.
        let inputs = ScoreInputs {
            rsi: Some(15.0),
            macd: Some(-0.9),
            macd_signal: Some(-0.4),
            ma_short: Some(92.0),
            ma_long: Some(101.0),
            current_price: Some(95.0),
            ..ScoreInputs::default()
        };
        let conflicted = SignalGenerator::default().generate(&inputs);

        let aligned = SignalGenerator::default().generate(&ScoreInputs {
            rsi: None,
            ..inputs
        });
        assert!(conflicted.confidence < aligned.confidence);
    }

    #[test]
    fn no_indicators_holds_at_half_confidence() {
        let signal = SignalGenerator::default().generate(&ScoreInputs::default());
        assert_eq!(signal.kind, SignalKind::Hold);
        assert!((signal.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn confidence_stays_clamped() {
        let signal = SignalGenerator::default().generate(&bullish_inputs());
        assert!(signal.confidence >= 0.1);
        assert!(signal.confidence <= 0.95);
    }

    #[test]
    fn signal_kind_round_trip() {
        for kind in [
            SignalKind::StrongBuy,
            SignalKind::Buy,
            SignalKind::Hold,
            SignalKind::Sell,
            SignalKind::StrongSell,
        ] {
            assert_eq!(SignalKind::parse(kind.as_str()), Some(kind));
        }
    }
}
