//! Access-state machine and the upward contract for the host UI
//!
//! The state is never stored. It is recomputed from three inputs on every
//! evaluation: whether a wallet exists, whether a credential exists, and
//! whether the session is live.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::activity::{ActivityMonitor, ActivityOutcome};
use crate::clock::Clock;
use crate::config::GateConfig;
use crate::credential::CredentialStore;
use crate::error::{AuthError, Result};
use crate::lockout::{AttemptTracker, LockoutPolicy};
use crate::policy::PinPolicy;
use crate::probe::WalletProbe;
use crate::session::SessionManager;
use crate::store::KeyValueStore;

/// What the host UI should render
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessState {
    /// No wallet yet: run onboarding
    Uninitialized,
    /// PIN required
    Locked,
    /// Wallet contents may be shown
    Unlocked,
}

/// Map the three gate inputs to an access state
///
/// Rules apply top to bottom: no wallet means onboarding regardless of any
/// stale credential or session; a credential without a live session locks;
/// everything else is unlocked.
pub fn resolve_access(wallet_exists: bool, has_credential: bool, session_valid: bool) -> AccessState {
    if !wallet_exists {
        AccessState::Uninitialized
    } else if has_credential && !session_valid {
        AccessState::Locked
    } else {
        AccessState::Unlocked
    }
}

/// Evaluated gate inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub wallet_exists: bool,
    pub has_credential: bool,
    pub unlocked: bool,
}

impl AccessSnapshot {
    /// Default used when the inputs cannot be evaluated.
    ///
    /// Fails open to onboarding: the host shows the landing flow instead of
    /// refusing to render. Not a security boundary.
    pub const FAIL_OPEN: Self = Self {
        wallet_exists: false,
        has_credential: false,
        unlocked: true,
    };

    /// Access state described by this snapshot
    pub fn state(&self) -> AccessState {
        resolve_access(self.wallet_exists, self.has_credential, self.unlocked)
    }
}

/// Composes credential, session and wallet probe into the gate
pub struct AccessController {
    credentials: CredentialStore,
    probe: Arc<dyn WalletProbe>,
    monitor: ActivityMonitor,
    clock: Arc<dyn Clock>,
    pin_policy: PinPolicy,
    attempts: AttemptTracker,
}

impl AccessController {
    /// Gate with default PIN and lockout policies
    pub fn new(
        credentials: CredentialStore,
        probe: Arc<dyn WalletProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            monitor: ActivityMonitor::new(credentials.clone()),
            probe,
            clock,
            pin_policy: PinPolicy::default(),
            attempts: AttemptTracker::new(LockoutPolicy::default(), credentials.store()),
            credentials,
        }
    }

    /// Build the full component graph over one store
    pub fn from_config(
        config: &GateConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn WalletProbe>,
    ) -> Self {
        let sessions =
            SessionManager::with_config(store.clone(), clock.clone(), config.session_config());
        let credentials = CredentialStore::new(store, sessions);
        Self::new(credentials, probe, clock)
            .with_policies(config.pin.clone(), config.lockout.clone())
    }

    /// Replace the PIN and lockout policies
    pub fn with_policies(mut self, pin_policy: PinPolicy, lockout: LockoutPolicy) -> Self {
        self.pin_policy = pin_policy;
        self.attempts = AttemptTracker::new(lockout, self.credentials.store());
        self
    }

    /// Get the credential store
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Get the session manager
    pub fn sessions(&self) -> &SessionManager {
        self.credentials.sessions()
    }

    /// Get the PIN format policy
    pub fn pin_policy(&self) -> &PinPolicy {
        &self.pin_policy
    }

    /// Get the failed-attempt tracker
    pub fn attempts(&self) -> &AttemptTracker {
        &self.attempts
    }

    /// Evaluate the gate inputs, surfacing probe and storage failures
    pub fn try_snapshot(&self) -> Result<AccessSnapshot> {
        if !self.probe.wallet_exists()? {
            return Ok(AccessSnapshot {
                wallet_exists: false,
                has_credential: false,
                unlocked: true,
            });
        }

        let has_credential = self.credentials.has_credential()?;
        let session_valid = has_credential && self.sessions().is_valid();
        let state = resolve_access(true, has_credential, session_valid);

        Ok(AccessSnapshot {
            wallet_exists: true,
            has_credential,
            unlocked: state == AccessState::Unlocked,
        })
    }

    /// Evaluate the gate inputs, failing open on error
    pub fn evaluate(&self) -> AccessSnapshot {
        self.try_snapshot().unwrap_or_else(|e| {
            warn!(error = %e, "access evaluation failed; falling back to onboarding");
            AccessSnapshot::FAIL_OPEN
        })
    }

    /// Initial evaluation at process start
    pub fn startup(&self) -> AccessSnapshot {
        let snapshot = self.evaluate();
        info!(
            state = ?snapshot.state(),
            wallet_exists = snapshot.wallet_exists,
            has_credential = snapshot.has_credential,
            "initial access state"
        );
        snapshot
    }

    /// Current access state, re-evaluated from storage
    pub fn state(&self) -> AccessState {
        self.evaluate().state()
    }

    /// Whether the PIN is required before showing the wallet
    pub fn is_locked(&self) -> bool {
        self.state() == AccessState::Locked
    }

    /// Whether wallet contents may be shown
    pub fn is_unlocked(&self) -> bool {
        self.state() == AccessState::Unlocked
    }

    /// Delegates to the wallet probe; probe errors read as "not initialized"
    pub fn is_wallet_initialized(&self) -> bool {
        self.probe.wallet_exists().unwrap_or_else(|e| {
            warn!(error = %e, "wallet probe failed");
            false
        })
    }

    /// Raw credential presence
    pub fn has_credential(&self) -> bool {
        self.credentials.has_credential().unwrap_or_else(|e| {
            warn!(error = %e, "credential presence check failed");
            false
        })
    }

    /// Store a PIN and open a session; requires an initialized wallet
    pub fn set_credential(&self, pin: &str) -> Result<()> {
        self.require_wallet()?;
        self.credentials.set_credential(pin)
    }

    /// The only path from `Locked` to `Unlocked`
    ///
    /// Returns `false` when no wallet exists, since a session may only exist
    /// for an initialized profile.
    pub fn verify_credential(&self, pin: &str) -> bool {
        if !self.is_wallet_initialized() {
            debug!("verify refused: wallet not initialized");
            return false;
        }
        self.credentials.verify_credential(pin)
    }

    /// Remove the credential and session
    pub fn clear_credential(&self) -> Result<()> {
        self.credentials.clear_credential()
    }

    /// Slide a live session forward; no-op otherwise
    pub fn extend(&self) -> Result<()> {
        self.sessions().extend()?;
        Ok(())
    }

    /// Time left in the current session
    pub fn remaining_time(&self) -> Duration {
        self.sessions().remaining_time()
    }

    /// Entry point for host input events
    pub fn record_activity(&self) -> ActivityOutcome {
        self.monitor.record_activity()
    }

    /// First-time PIN setup with confirmation entry
    pub fn setup_pin(&self, pin: &str, confirm: &str) -> Result<()> {
        self.pin_policy.validate_new(pin, confirm)?;
        self.set_credential(pin)
    }

    /// Unlock with lockout protection
    ///
    /// Malformed PINs are rejected before they count as an attempt.
    pub fn unlock(&self, pin: &str) -> Result<()> {
        self.require_wallet()?;
        if !self.has_credential() {
            return Err(AuthError::PinNotSetUp);
        }

        let now = self.clock.now_ms();
        self.attempts.check(now)?;
        self.pin_policy.validate(pin)?;

        if self.verify_credential(pin) {
            self.attempts.record_success()?;
            info!("wallet unlocked");
            Ok(())
        } else {
            Err(self.attempts.record_failure(now))
        }
    }

    /// Replace the PIN after proving the current one
    pub fn change_pin(&self, current: &str, new_pin: &str, confirm: &str) -> Result<()> {
        self.pin_policy.validate_new(new_pin, confirm)?;
        self.unlock(current)?;
        self.credentials.set_credential(new_pin)?;
        info!("PIN changed");
        Ok(())
    }

    /// Remove the PIN gate after proving the current PIN
    pub fn remove_pin(&self, current: &str) -> Result<()> {
        self.unlock(current)?;
        self.credentials.clear_credential()?;
        info!("PIN removed");
        Ok(())
    }

    /// Explicit lock: end the session, keep the credential
    pub fn lock(&self) -> Result<()> {
        self.sessions().clear()?;
        info!("wallet locked");
        Ok(())
    }

    /// Wallet reset flow: drop credential, session and attempt history
    pub fn reset(&self) -> Result<()> {
        self.credentials.clear_credential()?;
        self.attempts.record_success()?;
        info!("access gate reset");
        Ok(())
    }

    /// Seconds of unlock lockout remaining, if any
    pub fn lockout_remaining_secs(&self) -> Option<u64> {
        self.attempts.lockout_remaining_secs(self.clock.now_ms())
    }

    fn require_wallet(&self) -> Result<()> {
        if self.probe.wallet_exists()? {
            Ok(())
        } else {
            Err(AuthError::WalletNotInitialized)
        }
    }
}
