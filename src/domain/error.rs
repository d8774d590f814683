//! Domain error types.

/// Top-level error type for quantscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("provider unavailable for {ticker}: {reason}")]
    ProviderUnavailable { ticker: String, reason: String },

    #[error("insufficient history for {ticker}: have {bars}, need {minimum}")]
    InsufficientHistory {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid price series for {ticker}: {reason}")]
    InvalidSeries { ticker: String, reason: String },

    #[error("unusable fundamentals for {ticker}: {reason}")]
    InvalidFundamentals { ticker: String, reason: String },

    #[error("data access timed out after {elapsed_ms} ms")]
    DataAccessTimeout { elapsed_ms: u128 },

    #[error("invalid factor weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("no usable tickers left in the universe")]
    EmptyUniverse,

    #[error("backtest failed: {reason}")]
    Backtest { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    /// Transient provider failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScreenError::ProviderUnavailable { .. })
    }
}

impl From<&ScreenError> for std::process::ExitCode {
    fn from(err: &ScreenError) -> Self {
        let code: u8 = match err {
            ScreenError::Io(_) => 1,
            ScreenError::ConfigParse { .. }
            | ScreenError::ConfigMissing { .. }
            | ScreenError::ConfigInvalid { .. }
            | ScreenError::InvalidWeights { .. } => 2,
            ScreenError::ProviderUnavailable { .. }
            | ScreenError::DataAccessTimeout { .. }
            | ScreenError::InvalidSeries { .. }
            | ScreenError::InvalidFundamentals { .. } => 3,
            ScreenError::InsufficientHistory { .. }
            | ScreenError::EmptyUniverse => 5,
            ScreenError::Backtest { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
