use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPayload,
    AlreadyLocked,
    EmptyResult,
    TransportError,
}

/// Failure of one lookup request. Every variant is terminal for the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("lookup service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed lookup response: {0}")]
    MalformedBody(String),
    #[error("lookup request failed: {0}")]
    Transport(String),
}

impl LookupError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::TransportError
    }
}
