use filewhisperer_types::ExtractError;
use thiserror::Error;

/// Everything that can stop a request from producing a reply tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("engine pool exhausted: no instance became available within the timeout")]
    PoolExhausted,
    #[error("dissection failed: {0}")]
    Fatal(#[from] ExtractError),
}

pub type EngineResult<T> = Result<T, EngineError>;
