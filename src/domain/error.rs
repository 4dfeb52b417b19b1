//! Domain error types.

/// Top-level error type for newstrader.
#[derive(Debug, thiserror::Error)]
pub enum NewstraderError {
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

    #[error("unknown instrument {symbol}")]
    UnknownInstrument { symbol: String },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid bar series for {symbol}: {reason}")]
    InvalidBars { symbol: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("calendar error: {reason}")]
    Calendar { reason: String },

    #[error("execution error for {symbol}: {reason}")]
    Execution { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NewstraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        NewstraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        NewstraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&NewstraderError> for std::process::ExitCode {
    fn from(err: &NewstraderError) -> Self {
        let code: u8 = match err {
            NewstraderError::Io(_) => 1,
            NewstraderError::ConfigParse { .. }
            | NewstraderError::ConfigMissing { .. }
            | NewstraderError::ConfigInvalid { .. }
            | NewstraderError::UnknownInstrument { .. } => 2,
            NewstraderError::DataUnavailable { .. }
            | NewstraderError::InvalidBars { .. }
            | NewstraderError::InsufficientData { .. }
            | NewstraderError::Calendar { .. } => 3,
            NewstraderError::Execution { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
