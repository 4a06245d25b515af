//! Domain error types.

/// Top-level error type for marketsentry.
///
/// Row- and symbol-scoped failures are caught at that granularity by the
/// orchestrator and recorded as run warnings; only stage-level failures
/// surface through this type.
#[derive(Debug, thiserror::Error)]
pub enum SentryError {
    #[error("fetch failed from {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("transform failed: {reason}")]
    Transform { reason: String },

    #[error("load failed for {what}: {reason}")]
    Load { what: String, reason: String },

    #[error("indicator calculation failed for {symbol}: {reason}")]
    Calculation { symbol: String, reason: String },

    #[error("notification failed: {reason}")]
    Notification { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid rule {rule_id}: {reason}")]
    RuleInvalid { rule_id: i64, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SentryError> for std::process::ExitCode {
    fn from(err: &SentryError) -> Self {
        let code: u8 = match err {
            SentryError::Io(_) => 1,
            SentryError::ConfigParse { .. }
            | SentryError::ConfigMissing { .. }
            | SentryError::ConfigInvalid { .. } => 2,
            SentryError::Database { .. } | SentryError::DatabaseQuery { .. } => 3,
            SentryError::RuleInvalid { .. } => 4,
            SentryError::Fetch { .. } | SentryError::NoData { .. } => 5,
            SentryError::Validation { .. } | SentryError::Transform { .. } => 6,
            SentryError::Load { .. }
            | SentryError::Calculation { .. }
            | SentryError::Notification { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
