//! Sliding-expiration session window
//!
//! A session asserts that the owner proved possession of the PIN recently.
//! Expiry is lazy: a record past its `expiresAt` stays in storage until it is
//! overwritten or cleared, and is simply judged invalid on every read.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{duration_ms, Clock};
use crate::error::StorageError;
use crate::store::KeyValueStore;

/// Storage key of the session record
pub const SESSION_KEY: &str = "session";

/// Default session lifetime (15 minutes)
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Persisted session window, in epoch milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub created_at: u64,
    pub expires_at: u64,
}

impl SessionRecord {
    /// A window opened at `now_ms` lasting `timeout`
    pub fn starting_at(now_ms: u64, timeout: Duration) -> Self {
        Self {
            created_at: now_ms,
            expires_at: now_ms.saturating_add(duration_ms(timeout)),
        }
    }

    /// Whether the window is still open at `now_ms`
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }

    /// Time left at `now_ms`, zero once expired
    pub fn remaining_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now_ms))
    }
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Session lifetime from creation or last extension
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: SESSION_TIMEOUT,
        }
    }
}

/// Reads and writes the single session record
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(store, clock, SessionConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a fresh window from now, overwriting any previous session
    pub fn create(&self) -> Result<SessionRecord, StorageError> {
        let record = SessionRecord::starting_at(self.clock.now_ms(), self.config.timeout);
        self.write(&record)?;
        info!(expires_at = record.expires_at, "session created");
        Ok(record)
    }

    /// `true` iff a session exists and has not reached `expiresAt`
    pub fn is_valid(&self) -> bool {
        self.current()
            .is_some_and(|record| record.is_valid_at(self.clock.now_ms()))
    }

    /// Slide a live window forward from now
    ///
    /// Returns `Ok(false)` without writing when no valid session exists, so an
    /// expired session is never revived. The stored `expiresAt` never moves
    /// backwards, even if the wall clock does.
    pub fn extend(&self) -> Result<bool, StorageError> {
        let now = self.clock.now_ms();
        let Some(current) = self.current().filter(|r| r.is_valid_at(now)) else {
            debug!("session extend skipped: no valid session");
            return Ok(false);
        };

        let mut next = SessionRecord::starting_at(now, self.config.timeout);
        next.expires_at = next.expires_at.max(current.expires_at);
        self.write(&next)?;
        debug!(expires_at = next.expires_at, "session extended");
        Ok(true)
    }

    /// Delete the session record (explicit lock)
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY)?;
        info!("session cleared");
        Ok(())
    }

    /// Time until expiry; zero when absent or expired
    pub fn remaining_time(&self) -> Duration {
        self.current()
            .map(|record| record.remaining_at(self.clock.now_ms()))
            .unwrap_or(Duration::ZERO)
    }

    /// Load the stored session; unreadable or corrupt records count as absent
    pub fn current(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read session record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "ignoring corrupt session record");
                None
            }
        }
    }

    fn write(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let contents = serde_json::to_string(record)?;
        self.store.set(SESSION_KEY, &contents)
    }
}
