//! User-presence signal to session extension
//!
//! The host forwards raw input occurrences here, stripped of content. Only a
//! live session is ever written; this never creates one.

use tracing::warn;

use crate::credential::CredentialStore;

/// Result of a single activity signal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// A live session was slid forward
    Extended,
    /// No credential, no live session, or the write failed
    Ignored,
}

/// Forwards user presence into session extension
#[derive(Clone)]
pub struct ActivityMonitor {
    credentials: CredentialStore,
}

impl ActivityMonitor {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// Extend the session iff a credential exists and the session is live
    pub fn record_activity(&self) -> ActivityOutcome {
        let sessions = self.credentials.sessions();
        let has_credential = self.credentials.has_credential().unwrap_or(false);
        if !has_credential || !sessions.is_valid() {
            return ActivityOutcome::Ignored;
        }

        match sessions.extend() {
            Ok(true) => ActivityOutcome::Extended,
            Ok(false) => ActivityOutcome::Ignored,
            Err(e) => {
                warn!(error = %e, "failed to extend session on activity");
                ActivityOutcome::Ignored
            }
        }
    }
}
