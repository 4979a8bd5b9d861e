use thiserror::Error;

/// Every extractor/analyzer returns this. `Recoverable` is folded into the
/// parent's `error_message` meta entry and processing continues; `Fatal`
/// propagates out of the digest pass and aborts the whole request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("{0}")]
    Recoverable(String),
    #[error("{0}")]
    Fatal(String),
}

impl ExtractError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Recoverable(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Recoverable(m) | Self::Fatal(m) => m,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
