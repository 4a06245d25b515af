//! Alert delivery port trait.
//!
//! Delivery failures are reported in the outcome, never as an `Err`; the
//! pipeline treats notification as best-effort.

use chrono::NaiveDate;

use crate::domain::alert::AlertEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Email,
    Webhook,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Log => "log",
            Channel::Email => "email",
            Channel::Webhook => "webhook",
        }
    }

    pub fn parse(s: &str) -> Option<Channel> {
        match s.trim().to_lowercase().as_str() {
            "log" => Some(Channel::Log),
            "email" => Some(Channel::Email),
            "webhook" => Some(Channel::Webhook),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotifyOutcome {
    pub sent: bool,
    pub failed_channels: Vec<Channel>,
    pub errors: Vec<String>,
}

pub trait NotifierPort {
    fn notify(&self, alert: &AlertEvent, channels: &[Channel]) -> NotifyOutcome;

    /// One summary message covering a day's alerts.
    fn notify_digest(&self, alerts: &[AlertEvent], date: NaiveDate) -> NotifyOutcome;
}
