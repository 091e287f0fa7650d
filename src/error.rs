use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain has no blocks. Unreachable after construction.
    #[error("chain is empty")]
    EmptyChain,
    /// The proof search was abandoned because the service is shutting down.
    #[error("mining cancelled")]
    MiningCancelled,
    #[error("blockchain mutex poisoned")]
    LockPoisoned,
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl ResponseError for ChainError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChainError::MiningCancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
