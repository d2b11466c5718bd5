//! Brute-force protection for the interactive unlock path
//!
//! After `threshold` consecutive wrong PINs, further attempts are refused for
//! `lockout_secs`. When the lockout lapses the counter starts over. The
//! counter and lockout deadline are persisted next to the credential, so a
//! restarted host picks up where the last one stopped.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::duration_ms;
use crate::error::{AuthError, StorageError};
use crate::store::KeyValueStore;

/// Storage key of the failed-attempt record
pub const ATTEMPTS_KEY: &str = "pin_attempts";

/// Lockout policy for failed PIN attempts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lockout
    pub threshold: u32,
    /// Lockout length in seconds
    pub lockout_secs: u64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: 3,
            lockout_secs: 30,
        }
    }
}

impl LockoutPolicy {
    /// Get the lockout duration for a given number of failed attempts
    pub fn lockout_duration(&self, failed_attempts: u32) -> Option<Duration> {
        (failed_attempts >= self.threshold).then(|| Duration::from_secs(self.lockout_secs))
    }
}

/// Persisted attempt state, in epoch milliseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub failed_attempts: u32,
    #[serde(default)]
    pub locked_until: Option<u64>,
}

impl AttemptRecord {
    fn is_locked_at(&self, now_ms: u64) -> bool {
        self.locked_until.is_some_and(|until| now_ms < until)
    }
}

/// Failed-attempt counter backed by the key-value store
///
/// State is re-read on every call, so two gates over the same store share
/// one counter.
#[derive(Clone)]
pub struct AttemptTracker {
    policy: LockoutPolicy,
    store: Arc<dyn KeyValueStore>,
}

impl AttemptTracker {
    pub fn new(policy: LockoutPolicy, store: Arc<dyn KeyValueStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Stored attempt state; unreadable or corrupt records count as empty
    pub fn current(&self) -> AttemptRecord {
        let raw = match self.store.get(ATTEMPTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AttemptRecord::default(),
            Err(e) => {
                warn!(error = %e, "failed to read attempt record");
                return AttemptRecord::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring corrupt attempt record");
            AttemptRecord::default()
        })
    }

    /// Refuse while locked; clear a lapsed lockout
    pub fn check(&self, now_ms: u64) -> Result<(), AuthError> {
        let record = self.current();
        match record.locked_until {
            Some(until) if now_ms < until => Err(AuthError::LockedOut(ceil_secs(until - now_ms))),
            Some(_) => {
                debug!("lockout lapsed; attempt counter reset");
                self.record_success()?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Count a wrong PIN and return the error to surface
    ///
    /// Yields `LockedOut` once the threshold is hit, `IncorrectPin` before
    /// that, and `Storage` if the new count could not be saved.
    pub fn record_failure(&self, now_ms: u64) -> AuthError {
        let mut record = self.current();
        record.failed_attempts = record.failed_attempts.saturating_add(1);

        let lockout = self.policy.lockout_duration(record.failed_attempts);
        if let Some(duration) = lockout {
            warn!(
                failed_attempts = record.failed_attempts,
                lockout_secs = duration.as_secs(),
                "too many incorrect PIN attempts"
            );
            record.locked_until = Some(now_ms.saturating_add(duration_ms(duration)));
        }

        if let Err(e) = self.write(&record) {
            return e.into();
        }

        match lockout {
            Some(duration) => AuthError::LockedOut(duration.as_secs()),
            None => AuthError::IncorrectPin(self.remaining_for(&record)),
        }
    }

    /// Reset after a successful unlock or a wallet reset
    pub fn record_success(&self) -> Result<(), StorageError> {
        self.store.remove(ATTEMPTS_KEY)
    }

    /// Attempts left before the next lockout
    pub fn attempts_remaining(&self) -> u32 {
        self.remaining_for(&self.current())
    }

    /// Seconds of lockout left at `now_ms`, if locked
    pub fn lockout_remaining_secs(&self, now_ms: u64) -> Option<u64> {
        let record = self.current();
        if !record.is_locked_at(now_ms) {
            return None;
        }
        record.locked_until.map(|until| ceil_secs(until - now_ms))
    }

    fn remaining_for(&self, record: &AttemptRecord) -> u32 {
        self.policy.threshold.saturating_sub(record.failed_attempts)
    }

    fn write(&self, record: &AttemptRecord) -> Result<(), StorageError> {
        let contents = serde_json::to_string(record)?;
        self.store.set(ATTEMPTS_KEY, &contents)
    }
}

fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: u64 = 1_000_000;

    fn tracker() -> (Arc<MemoryStore>, AttemptTracker) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), AttemptTracker::new(LockoutPolicy::default(), store))
    }

    #[test]
    fn test_default_policy() {
        let policy = LockoutPolicy::default();
        assert!(policy.lockout_duration(0).is_none());
        assert!(policy.lockout_duration(2).is_none());
        assert_eq!(policy.lockout_duration(3), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_lockout_after_threshold() {
        let (_, tracker) = tracker();

        assert!(matches!(tracker.record_failure(NOW), AuthError::IncorrectPin(2)));
        assert!(matches!(tracker.record_failure(NOW), AuthError::IncorrectPin(1)));
        assert!(matches!(tracker.record_failure(NOW), AuthError::LockedOut(30)));

        assert!(matches!(tracker.check(NOW + 1_000), Err(AuthError::LockedOut(29))));
        assert_eq!(tracker.lockout_remaining_secs(NOW + 29_500), Some(1));
    }

    #[test]
    fn test_lockout_lapses_and_resets() {
        let (store, tracker) = tracker();
        for _ in 0..3 {
            tracker.record_failure(NOW);
        }

        assert!(tracker.check(NOW + 30_000).is_ok());
        assert_eq!(tracker.attempts_remaining(), 3);
        assert_eq!(tracker.lockout_remaining_secs(NOW + 30_000), None);
        assert!(!store.contains(ATTEMPTS_KEY).unwrap());
    }

    #[test]
    fn test_success_resets_counter() {
        let (_, tracker) = tracker();
        tracker.record_failure(NOW);
        tracker.record_failure(NOW);

        tracker.record_success().unwrap();
        assert_eq!(tracker.attempts_remaining(), 3);
        assert!(matches!(tracker.record_failure(NOW), AuthError::IncorrectPin(2)));
    }

    #[test]
    fn test_state_shared_through_store() {
        let (store, first) = tracker();
        first.record_failure(NOW);
        first.record_failure(NOW);

        // A second tracker over the same store continues the count
        let second = AttemptTracker::new(LockoutPolicy::default(), store);
        assert_eq!(second.attempts_remaining(), 1);
        assert!(matches!(second.record_failure(NOW), AuthError::LockedOut(30)));
        assert!(matches!(first.check(NOW), Err(AuthError::LockedOut(30))));
    }

    #[test]
    fn test_record_format() {
        let (store, tracker) = tracker();
        for _ in 0..3 {
            tracker.record_failure(NOW);
        }

        let raw = store.get(ATTEMPTS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["failedAttempts"], 3);
        assert_eq!(value["lockedUntil"], NOW + 30_000);
    }

    #[test]
    fn test_corrupt_record_counts_as_empty() {
        let (store, tracker) = tracker();
        store.set(ATTEMPTS_KEY, "not json").unwrap();

        assert_eq!(tracker.current(), AttemptRecord::default());
        assert!(tracker.check(NOW).is_ok());
        assert!(matches!(tracker.record_failure(NOW), AuthError::IncorrectPin(2)));
    }
}
