//! Domain error types.

/// Top-level error type for marketlens.
#[derive(Debug, thiserror::Error)]
pub enum MarketlensError {
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

    #[error("instrument not found: {ticker}")]
    NotFound { ticker: String },

    #[error("insufficient data for {subject}: have {have} observations, need {need}")]
    InsufficientData {
        subject: String,
        have: usize,
        need: usize,
    },

    #[error("invalid price series for {ticker}: {reason}")]
    InvalidSeries { ticker: String, reason: String },

    #[error("degenerate data for {subject}: {reason}")]
    DegenerateData { subject: String, reason: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("json encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarketlensError {
    /// True for outcomes that mean "no meaningful result" rather than a failure
    /// of the surrounding system.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            MarketlensError::InsufficientData { .. } | MarketlensError::DegenerateData { .. }
        )
    }
}

impl From<&MarketlensError> for std::process::ExitCode {
    fn from(err: &MarketlensError) -> Self {
        let code: u8 = match err {
            MarketlensError::Io(_) | MarketlensError::Json(_) => 1,
            MarketlensError::ConfigParse { .. }
            | MarketlensError::ConfigMissing { .. }
            | MarketlensError::ConfigInvalid { .. }
            | MarketlensError::InvalidArgument { .. } => 2,
            MarketlensError::Database { .. } | MarketlensError::DatabaseQuery { .. } => 3,
            MarketlensError::NotFound { .. } | MarketlensError::InvalidSeries { .. } => 4,
            MarketlensError::InsufficientData { .. } | MarketlensError::DegenerateData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
