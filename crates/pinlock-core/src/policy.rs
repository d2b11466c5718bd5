//! PIN format policy

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Minimum PIN length
pub const MIN_PIN_LENGTH: usize = 6;
/// Maximum PIN length
pub const MAX_PIN_LENGTH: usize = 8;

/// Accepted PIN shape: ASCII digits within a length range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PIN_LENGTH,
            max_length: MAX_PIN_LENGTH,
        }
    }
}

impl PinPolicy {
    /// Validate PIN format
    pub fn validate(&self, pin: &str) -> Result<(), AuthError> {
        if pin.len() < self.min_length || pin.len() > self.max_length {
            return Err(AuthError::InvalidPinLength(self.min_length, self.max_length));
        }

        if !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidPinFormat);
        }

        Ok(())
    }

    /// Validate a new PIN and its confirmation entry
    pub fn validate_new(&self, pin: &str, confirm: &str) -> Result<(), AuthError> {
        self.validate(pin)?;
        if pin != confirm {
            return Err(AuthError::PinMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_validation() {
        let policy = PinPolicy::default();

        // Too short
        assert!(matches!(
            policy.validate("12345"),
            Err(AuthError::InvalidPinLength(6, 8))
        ));

        // Too long
        assert!(policy.validate("123456789").is_err());

        // Non-digits
        assert!(matches!(
            policy.validate("12345a"),
            Err(AuthError::InvalidPinFormat)
        ));

        // Valid
        assert!(policy.validate("123456").is_ok());
        assert!(policy.validate("12345678").is_ok());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic digits are numeric but not ASCII
        assert!(PinPolicy::default().validate("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_confirmation_mismatch() {
        let policy = PinPolicy::default();
        assert!(matches!(
            policy.validate_new("123456", "123457"),
            Err(AuthError::PinMismatch)
        ));
        assert!(policy.validate_new("123456", "123456").is_ok());
    }
}
