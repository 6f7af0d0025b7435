use std::path::PathBuf;
use thiserror::Error;

/// Every failure of a volatility run. All of them are fatal to the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolatilityError {
    #[error("failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {} (line {line}): {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("timed out after {waited_ms}ms waiting for {pending} ticker file(s)")]
    Timeout { waited_ms: u64, pending: usize },

    #[error("failed to render report: {0}")]
    Render(String),

    #[error("worker failure: {0}")]
    Worker(String),
}

impl VolatilityError {
    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        VolatilityError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        VolatilityError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, VolatilityError::InsufficientData(_))
    }
}
