//! PIN hashing primitives
//!
//! PINs are stretched with PBKDF2-HMAC-SHA256 over a random per-credential
//! salt. Iteration count and output length are fixed so that records written
//! by one build verify under every other.

use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AuthError;

/// PBKDF2 iteration count
pub const PIN_HASH_ITERATIONS: u32 = 10_000;

/// Derived hash length in bytes (512 bits)
pub const PIN_HASH_LEN: usize = 64;

/// Salt length in bytes (128 bits)
pub const SALT_LEN: usize = 16;

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the PIN hash for `pin` under `salt`
///
/// # Errors
///
/// Returns [`AuthError::Crypto`] if PBKDF2 rejects the output length.
pub fn derive_pin_hash(pin: &str, salt: &[u8]) -> Result<[u8; PIN_HASH_LEN], AuthError> {
    let pin_bytes = Zeroizing::new(pin.as_bytes().to_vec());
    let mut output = [0u8; PIN_HASH_LEN];

    pbkdf2::pbkdf2::<Hmac<Sha256>>(&pin_bytes, salt, PIN_HASH_ITERATIONS, &mut output)
        .map_err(|e| AuthError::Crypto(format!("PBKDF2-HMAC-SHA256 failed: {e}")))?;

    Ok(output)
}

/// Constant-time equality; slices of different lengths never match
pub fn hashes_match(derived: &[u8], stored: &[u8]) -> bool {
    derived.ct_eq(stored).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_pin_hash("123456", &salt).unwrap();
        let b = derive_pin_hash("123456", &salt).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_changes_hash() {
        let a = derive_pin_hash("123456", &[1u8; SALT_LEN]).unwrap();
        let b = derive_pin_hash("123456", &[2u8; SALT_LEN]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pin_changes_hash() {
        let salt = generate_salt();
        let a = derive_pin_hash("123456", &salt).unwrap();
        let b = derive_pin_hash("123457", &salt).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_salt_is_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_hashes_match() {
        let hash = derive_pin_hash("000000", &[0u8; SALT_LEN]).unwrap();
        assert!(hashes_match(&hash, &hash));

        let mut tampered = hash;
        tampered[PIN_HASH_LEN - 1] ^= 1;
        assert!(!hashes_match(&hash, &tampered));

        // Truncated stored hash
        assert!(!hashes_match(&hash, &hash[..32]));
        assert!(!hashes_match(&hash, &[]));
    }
}
