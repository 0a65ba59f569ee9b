//! Domain error types.
//!
//! Only collaborators produce errors; the pairing and scoring engines have
//! no fatal error surface and degrade to neutral sub-scores instead.

/// Top-level error type for tradereview.
#[derive(Debug, thiserror::Error)]
pub enum TradereviewError {
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

    #[error("bar store error: {reason}")]
    BarStore { reason: String },

    #[error("transaction log error: {reason}")]
    TransactionLog { reason: String },

    #[error("no record data for {ticker}")]
    NoData { ticker: String },

    #[error("fetch command failed: {reason}")]
    Fetch { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradereviewError> for std::process::ExitCode {
    fn from(err: &TradereviewError) -> Self {
        let code: u8 = match err {
            TradereviewError::Io(_) => 1,
            TradereviewError::ConfigParse { .. }
            | TradereviewError::ConfigMissing { .. }
            | TradereviewError::ConfigInvalid { .. } => 2,
            TradereviewError::BarStore { .. } => 3,
            TradereviewError::TransactionLog { .. } => 4,
            TradereviewError::NoData { .. } => 5,
            TradereviewError::Fetch { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
