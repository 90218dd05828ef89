use thiserror::Error;

use crate::crypto::CryptoError;

/// Top-level error type for the entire application.
///
/// Orchestrator callers never see these kinds across the HTTP boundary —
/// handlers collapse every failure into the generic invalid envelope — but
/// each failure path stays typed internally so the settlement worker and the
/// tests can tell them apart.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("request not found or expired")]
    RequestNotFound,

    #[error("swap event has ended")]
    EventExpired,

    #[error("no public key on file for signer {0}")]
    UnknownSigner(String),

    #[error("chain id mismatch: got {0}")]
    ChainMismatch(String),

    #[error("signer mismatch: expected {expected}, got {actual}")]
    SignerMismatch { expected: String, actual: String },

    #[error("source transaction failed with code {0}")]
    TransactionFailed(i64),

    #[error("invalid transfer proof: {0}")]
    InvalidTransferProof(String),

    #[error("reward transfer failed with code {0}")]
    RewardTransferFailed(i64),

    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Collaborator(format!("http request: {error}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        AppError::Collaborator(format!("store: {error}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Collaborator(format!("json: {error}"))
    }
}

impl From<CryptoError> for AppError {
    fn from(error: CryptoError) -> Self {
        AppError::Collaborator(format!("decrypt: {error}"))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
