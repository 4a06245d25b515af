//! Log-backed notification adapter.
//!
//! Writes alerts to the process log. Email and webhook channels are not
//! wired here; requesting them reports those channels as failed without
//! failing the pipeline.

use chrono::NaiveDate;
use log::{info, warn};

use crate::domain::alert::{AlertEvent, Severity};
use crate::ports::notifier_port::{Channel, NotifierPort, NotifyOutcome};

#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl NotifierPort for LogNotifier {
    fn notify(&self, alert: &AlertEvent, channels: &[Channel]) -> NotifyOutcome {
        let mut outcome = NotifyOutcome::default();

        for channel in channels {
            match channel {
                Channel::Log => {
                    match alert.severity {
                        Severity::Critical => warn!("[ALERT:CRITICAL] {}", alert.message),
                        Severity::Warning => warn!("[ALERT:WARNING] {}", alert.message),
                        Severity::Info => info!("[ALERT:INFO] {}", alert.message),
                    }
                    outcome.sent = true;
                }
                other => {
                    outcome.failed_channels.push(*other);
                    outcome
                        .errors
                        .push(format!("channel '{}' is not configured", other.as_str()));
                }
            }
        }

        outcome
    }

    fn notify_digest(&self, alerts: &[AlertEvent], date: NaiveDate) -> NotifyOutcome {
        let critical = alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count();
        let warning = alerts
            .iter()
            .filter(|a| a.severity == Severity::Warning)
            .count();
        info!(
            "[DIGEST {date}] {} alerts ({critical} critical, {warning} warning)",
            alerts.len()
        );
        for alert in alerts {
            info!("  {} {}", alert.severity.as_str(), alert.message);
        }

        NotifyOutcome {
            sent: true,
            ..NotifyOutcome::default()
        }
    }
}
