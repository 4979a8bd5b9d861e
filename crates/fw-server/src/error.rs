use filewhisperer_engine::EngineError;
use thiserror::Error;

/// Every way a single RPC can fail, mapped to the two status codes the
/// service surface admits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServiceError> for tonic::Status {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::InvalidRequest(message) => tonic::Status::invalid_argument(message),
            ServiceError::Engine(e) => tonic::Status::internal(e.to_string()),
            ServiceError::Io(e) => tonic::Status::internal(e.to_string()),
        }
    }
}
