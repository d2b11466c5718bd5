//! Property-based tests for pinlock-core using proptest
//!
//! PBKDF2 runs at full strength here, so case counts are kept small.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use pinlock_core::{
    resolve_access, AccessState, CredentialStore, KeyValueStore, ManualClock, MemoryStore,
    SessionManager, CREDENTIAL_KEY,
};

const T0: u64 = 1_700_000_000_000;

fn credential_store() -> (Arc<MemoryStore>, Arc<ManualClock>, CredentialStore) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let sessions = SessionManager::new(store.clone(), clock.clone());
    let credentials = CredentialStore::new(store.clone(), sessions);
    (store, clock, credentials)
}

fn arb_pin() -> impl Strategy<Value = String> {
    "[0-9]{6,8}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn set_then_verify_succeeds(pin in arb_pin()) {
        let (_, _, credentials) = credential_store();
        credentials.set_credential(&pin).unwrap();
        prop_assert!(credentials.verify_credential(&pin));
    }

    #[test]
    fn different_pin_never_verifies(p1 in arb_pin(), p2 in arb_pin()) {
        prop_assume!(p1 != p2);
        let (_, _, credentials) = credential_store();
        credentials.set_credential(&p1).unwrap();
        prop_assert!(!credentials.verify_credential(&p2));
    }

    #[test]
    fn verify_never_mutates_record(pin in arb_pin(), guess in arb_pin()) {
        let (store, _, credentials) = credential_store();
        credentials.set_credential(&pin).unwrap();
        let before = store.get(CREDENTIAL_KEY).unwrap();

        credentials.verify_credential(&guess);
        prop_assert_eq!(store.get(CREDENTIAL_KEY).unwrap(), before);
    }

    #[test]
    fn arbitrary_record_text_never_verifies(raw in ".*", pin in arb_pin()) {
        let (store, _, credentials) = credential_store();
        store.set(CREDENTIAL_KEY, &raw).unwrap();
        prop_assert!(!credentials.verify_credential(&pin));
        prop_assert!(!credentials.sessions().is_valid());
    }
}

proptest! {
    #[test]
    fn extend_never_revives(offset_secs in 0u64..3600, created in any::<bool>()) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let sessions = SessionManager::new(store, clock.clone());
        if created {
            sessions.create().unwrap();
        }

        clock.advance(Duration::from_secs(offset_secs));
        let was_valid = sessions.is_valid();
        let before = sessions.current();

        let wrote = sessions.extend().unwrap();
        prop_assert_eq!(wrote, was_valid);
        if !was_valid {
            prop_assert!(!sessions.is_valid());
            prop_assert_eq!(sessions.current(), before);
        }
    }

    #[test]
    fn expiry_only_moves_forward(steps in prop::collection::vec(0u64..600, 1..20)) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let sessions = SessionManager::new(store, clock.clone());
        sessions.create().unwrap();

        let mut last_expiry = sessions.current().unwrap().expires_at;
        for step in steps {
            clock.advance(Duration::from_secs(step));
            sessions.extend().unwrap();
            let expiry = sessions.current().unwrap().expires_at;
            prop_assert!(expiry >= last_expiry);
            last_expiry = expiry;
        }
    }

    #[test]
    fn no_wallet_is_always_uninitialized(has_credential in any::<bool>(), valid in any::<bool>()) {
        prop_assert_eq!(resolve_access(false, has_credential, valid), AccessState::Uninitialized);
    }
}
