//! PIN credential storage and verification
//!
//! At most one credential exists per profile. It is persisted as
//! `{"hash": "<hex>", "salt": "<hex>"}` and is only ever replaced wholesale
//! or deleted; verification is read-only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::{derive_pin_hash, generate_salt, hashes_match};
use crate::error::{Result, StorageError};
use crate::session::SessionManager;
use crate::store::KeyValueStore;

/// Storage key of the credential record
pub const CREDENTIAL_KEY: &str = "pin_hash";

/// Decoded credential record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// On-disk representation
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    hash: String,
    salt: String,
}

impl From<&CredentialRecord> for StoredCredential {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            hash: hex::encode(&record.hash),
            salt: hex::encode(&record.salt),
        }
    }
}

/// Classified outcome of checking a PIN against the stored record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialCheck {
    /// PIN matches the stored hash
    Match,
    /// Record is well-formed but the PIN is wrong
    Mismatch,
    /// No record stored (or it could not be read)
    Absent,
    /// Stored value is not a parsable record
    StorageCorrupt,
    /// Record parsed but its salt or hash is unusable
    CryptoFailure,
}

/// Persists and verifies the PIN credential
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    sessions: SessionManager,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>, sessions: SessionManager) -> Self {
        Self { store, sessions }
    }

    /// Session manager that successful verification opens sessions on
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Backing store shared with the session and attempt records
    pub(crate) fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Hash `pin` under a fresh salt, replace any stored credential, and open
    /// a new session (setting a PIN proves the owner is present)
    pub fn set_credential(&self, pin: &str) -> Result<()> {
        let salt = generate_salt();
        let hash = derive_pin_hash(pin, &salt)?;

        let record = CredentialRecord {
            hash: hash.to_vec(),
            salt: salt.to_vec(),
        };
        let contents =
            serde_json::to_string(&StoredCredential::from(&record)).map_err(StorageError::from)?;
        self.store.set(CREDENTIAL_KEY, &contents)?;
        info!("PIN credential stored");

        self.sessions.create()?;
        Ok(())
    }

    /// Check `pin` and open a session on success
    ///
    /// Absent, corrupt or malformed records yield `false`; nothing is written
    /// unless the PIN matches.
    pub fn verify_credential(&self, pin: &str) -> bool {
        if self.check(pin) != CredentialCheck::Match {
            return false;
        }

        if let Err(e) = self.sessions.create() {
            warn!(error = %e, "PIN verified but session could not be stored");
            return false;
        }
        true
    }

    /// Compare `pin` to the stored record without side effects
    pub fn check(&self, pin: &str) -> CredentialCheck {
        let record = match self.load() {
            Ok(Some(record)) => record,
            Ok(None) => return CredentialCheck::Absent,
            Err(check) => return check,
        };

        let derived = match derive_pin_hash(pin, &record.salt) {
            Ok(derived) => derived,
            Err(e) => {
                warn!(error = %e, "PIN derivation failed");
                return CredentialCheck::CryptoFailure;
            }
        };

        if hashes_match(&derived, &record.hash) {
            debug!("PIN check matched");
            CredentialCheck::Match
        } else {
            debug!("PIN check mismatched");
            CredentialCheck::Mismatch
        }
    }

    /// Whether a credential record is present
    ///
    /// This is a raw presence check: a corrupt record still counts, even
    /// though it can never verify.
    pub fn has_credential(&self) -> std::result::Result<bool, StorageError> {
        self.store.contains(CREDENTIAL_KEY)
    }

    /// Delete the credential and any active session
    pub fn clear_credential(&self) -> Result<()> {
        self.store.remove(CREDENTIAL_KEY)?;
        self.sessions.clear()?;
        info!("PIN credential cleared");
        Ok(())
    }

    /// Load and decode the stored record
    ///
    /// `Err` carries the classification of an unusable record.
    fn load(&self) -> std::result::Result<Option<CredentialRecord>, CredentialCheck> {
        let raw = match self.store.get(CREDENTIAL_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "failed to read credential record");
                return Ok(None);
            }
        };

        let stored: StoredCredential = serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "credential record is corrupt");
            CredentialCheck::StorageCorrupt
        })?;

        let salt = hex::decode(&stored.salt).map_err(|e| {
            warn!(error = %e, "credential salt is not valid hex");
            CredentialCheck::CryptoFailure
        })?;
        let hash = hex::decode(&stored.hash).map_err(|e| {
            warn!(error = %e, "credential hash is not valid hex");
            CredentialCheck::CryptoFailure
        })?;
        if salt.is_empty() || hash.is_empty() {
            warn!("credential record has an empty salt or hash");
            return Err(CredentialCheck::CryptoFailure);
        }

        Ok(Some(CredentialRecord { hash, salt }))
    }
}
