//! pinlock - local access gate for a self-custodial wallet profile
//!
//! This crate decides whether the host may show wallet contents or must ask
//! for the PIN again:
//! - [`CredentialStore`] keeps a salted PBKDF2 hash of the PIN
//! - [`SessionManager`] keeps a sliding 15-minute session window
//! - [`AccessController`] maps wallet/credential/session to an [`AccessState`]
//! - [`ActivityMonitor`] extends a live session on user input
//!
//! Storage, time and the wallet-existence signal are injected through the
//! [`KeyValueStore`], [`Clock`] and [`WalletProbe`] traits.

pub mod access;
pub mod activity;
pub mod clock;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod lockout;
pub mod policy;
pub mod probe;
pub mod session;
pub mod store;

pub use access::{resolve_access, AccessController, AccessSnapshot, AccessState};
pub use activity::{ActivityMonitor, ActivityOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GateConfig;
pub use credential::{CredentialCheck, CredentialRecord, CredentialStore, CREDENTIAL_KEY};
pub use error::{AuthError, Result, StorageError};
pub use lockout::{AttemptRecord, AttemptTracker, LockoutPolicy, ATTEMPTS_KEY};
pub use policy::{PinPolicy, MAX_PIN_LENGTH, MIN_PIN_LENGTH};
pub use probe::{ProbeError, StaticProbe, WalletFileProbe, WalletProbe};
pub use session::{SessionConfig, SessionManager, SessionRecord, SESSION_KEY, SESSION_TIMEOUT};
pub use store::{FileStore, KeyValueStore, MemoryStore};
