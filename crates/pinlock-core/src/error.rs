//! Error types for the pinlock gate

use thiserror::Error;

use crate::probe::ProbeError;

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors surfaced to the hosting application
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Wallet probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Wallet is not initialized - complete onboarding first")]
    WalletNotInitialized,

    #[error("PIN not set up")]
    PinNotSetUp,

    #[error("Incorrect PIN ({0} attempts remaining)")]
    IncorrectPin(u32),

    #[error("Too many attempts - locked for {0} seconds")]
    LockedOut(u64),

    #[error("PIN must be {0}-{1} digits")]
    InvalidPinLength(usize, usize),

    #[error("PIN must contain only digits")]
    InvalidPinFormat,

    #[error("PINs do not match")]
    PinMismatch,

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures of the underlying key-value backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key cannot be mapped onto the backend
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
