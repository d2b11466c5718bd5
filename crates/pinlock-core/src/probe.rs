//! Wallet-existence probe
//!
//! The gate never touches key material. It only asks the host whether a
//! wallet has been created on this profile.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Failure while asking the host whether a wallet exists
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        ProbeError(e.to_string())
    }
}

/// Reports whether wallet key material exists for this profile
pub trait WalletProbe: Send + Sync {
    fn wallet_exists(&self) -> Result<bool, ProbeError>;
}

/// Treats the presence of a wallet file as "initialized"
#[derive(Clone, Debug)]
pub struct WalletFileProbe {
    path: PathBuf,
}

impl WalletFileProbe {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl WalletProbe for WalletFileProbe {
    fn wallet_exists(&self) -> Result<bool, ProbeError> {
        Ok(self.path.try_exists()?)
    }
}

/// Probe with a host-controlled answer
#[derive(Debug, Default)]
pub struct StaticProbe {
    exists: AtomicBool,
}

impl StaticProbe {
    pub fn new(exists: bool) -> Self {
        Self {
            exists: AtomicBool::new(exists),
        }
    }

    pub fn set(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }
}

impl WalletProbe for StaticProbe {
    fn wallet_exists(&self) -> Result<bool, ProbeError> {
        Ok(self.exists.load(Ordering::SeqCst))
    }
}
