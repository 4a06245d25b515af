//! Alert rules and generated alert events.
//!
//! Rules are stored with a type tag plus parameters; in memory they are a
//! closed [`RuleKind`] enum so each check receives exactly the parameters it
//! needs and unknown rule types are rejected at the storage boundary.

use chrono::NaiveDate;

use crate::domain::error::SentryError;
use crate::domain::indicator::CrossoverSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Some(Severity::Info),
            "WARNING" => Some(Severity::Warning),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Which side of the RSI band a rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiSide {
    Oversold,
    Overbought,
}

/// Typed rule variants. One variant per supported check.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// |daily % change| at or above the threshold.
    PriceMovement { threshold_pct: f64 },
    /// Latest crossover signal matches the rule's polarity.
    MaCrossover { direction: CrossoverSignal },
    /// RSI at or beyond the threshold on the given side.
    Rsi { side: RsiSide, threshold: f64 },
    /// Annualized volatility (fraction) at or above the threshold.
    Volatility { threshold: f64 },
    /// Volume at or above trailing average times the multiplier.
    VolumeSpike { multiplier: f64, lookback_days: i64 },
}

impl RuleKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            RuleKind::PriceMovement { .. } => "PRICE_MOVEMENT",
            RuleKind::MaCrossover { .. } => "MA_CROSSOVER",
            RuleKind::Rsi { .. } => "RSI",
            RuleKind::Volatility { .. } => "VOLATILITY",
            RuleKind::VolumeSpike { .. } => "VOLUME_SPIKE",
        }
    }

    /// Encode the variant's parameters as `key=value` pairs for storage.
    pub fn params_string(&self) -> String {
        match self {
            RuleKind::PriceMovement { threshold_pct } => {
                format!("threshold={threshold_pct}")
            }
            RuleKind::MaCrossover { direction } => {
                format!("direction={}", direction.as_str())
            }
            RuleKind::Rsi { side, threshold } => {
                let side = match side {
                    RsiSide::Oversold => "OVERSOLD",
                    RsiSide::Overbought => "OVERBOUGHT",
                };
                format!("side={side};threshold={threshold}")
            }
            RuleKind::Volatility { threshold } => format!("threshold={threshold}"),
            RuleKind::VolumeSpike {
                multiplier,
                lookback_days,
            } => format!("multiplier={multiplier};lookback_days={lookback_days}"),
        }
    }

    /// Decode a `(type_tag, params)` pair from storage.
    pub fn from_stored(rule_id: i64, type_tag: &str, params: &str) -> Result<RuleKind, SentryError> {
        let fields = parse_params(params);
        let get = |key: &str| -> Result<&str, SentryError> {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| SentryError::RuleInvalid {
                    rule_id,
                    reason: format!("missing parameter '{key}'"),
                })
        };
        let get_f64 = |key: &str| -> Result<f64, SentryError> {
            get(key)?.parse::<f64>().map_err(|_| SentryError::RuleInvalid {
                rule_id,
                reason: format!("parameter '{key}' is not a number"),
            })
        };

        match type_tag {
            "PRICE_MOVEMENT" => Ok(RuleKind::PriceMovement {
                threshold_pct: get_f64("threshold")?,
            }),
            "MA_CROSSOVER" => {
                let raw = get("direction")?;
                let direction =
                    CrossoverSignal::parse(raw).ok_or_else(|| SentryError::RuleInvalid {
                        rule_id,
                        reason: format!("unknown crossover direction '{raw}'"),
                    })?;
                Ok(RuleKind::MaCrossover { direction })
            }
            "RSI" => {
                let side = match get("side")?.to_uppercase().as_str() {
                    "OVERSOLD" => RsiSide::Oversold,
                    "OVERBOUGHT" => RsiSide::Overbought,
                    other => {
                        return Err(SentryError::RuleInvalid {
                            rule_id,
                            reason: format!("unknown RSI side '{other}'"),
                        });
                    }
                };
                Ok(RuleKind::Rsi {
                    side,
                    threshold: get_f64("threshold")?,
                })
            }
            "VOLATILITY" => Ok(RuleKind::Volatility {
                threshold: get_f64("threshold")?,
            }),
            "VOLUME_SPIKE" => Ok(RuleKind::VolumeSpike {
                multiplier: get_f64("multiplier")?,
                lookback_days: get_f64("lookback_days")? as i64,
            }),
            other => Err(SentryError::RuleInvalid {
                rule_id,
                reason: format!("unknown rule type '{other}'"),
            }),
        }
    }
}

fn parse_params(params: &str) -> Vec<(&str, &str)> {
    params
        .split(';')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((k.trim(), v.trim()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub rule_id: i64,
    pub name: String,
    pub kind: RuleKind,
    pub severity: Severity,
    pub active: bool,
}

/// A triggered alert. At most one exists per (symbol, rule, date).
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub rule_id: i64,
    pub alert_date: NaiveDate,
    pub severity: Severity,
    pub message: String,
    pub trigger_value: f64,
    pub resolved: bool,
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_round_trip() {
        for sev in [Severity::Info, Severity::Warning, Severity::Critical] {
            assert_eq!(Severity::parse(sev.as_str()), Some(sev));
        }
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn rule_kind_round_trip() {
        let kinds = [
            RuleKind::PriceMovement { threshold_pct: 5.0 },
            RuleKind::MaCrossover {
                direction: CrossoverSignal::Bullish,
            },
            RuleKind::Rsi {
                side: RsiSide::Oversold,
                threshold: 30.0,
            },
            RuleKind::Volatility { threshold: 0.6 },
            RuleKind::VolumeSpike {
                multiplier: 2.0,
                lookback_days: 30,
            },
        ];
        for kind in kinds {
            let decoded =
                RuleKind::from_stored(1, kind.type_tag(), &kind.params_string()).unwrap();
            assert_eq!(decoded, kind);
        }
    }

    #[test]
    fn unknown_rule_type_is_rejected() {
        let err = RuleKind::from_stored(7, "MOON_PHASE", "threshold=1").unwrap_err();
        assert!(matches!(err, SentryError::RuleInvalid { rule_id: 7, .. }));
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let err = RuleKind::from_stored(3, "PRICE_MOVEMENT", "").unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }
}
