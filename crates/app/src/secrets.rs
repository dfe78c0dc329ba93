//! Random secret material.

use std::fmt;

use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use zeroize::Zeroize;

/// Length of the per-process server role password.
pub const ROTATION_SECRET_LEN: usize = 16;

/// Number of digits in a magic code.
pub const MAGIC_CODE_DIGITS: usize = 6;

/// Password minted for the constrained database role on every process start.
#[derive(Clone)]
pub struct RotationSecret {
    value: String,
}

impl RotationSecret {
    /// Generate a fresh alphanumeric secret of [`ROTATION_SECRET_LEN`] characters.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            value: random_alphanumeric(ROTATION_SECRET_LEN),
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl From<String> for RotationSecret {
    fn from(value: String) -> Self {
        Self { value }
    }
}

impl fmt::Debug for RotationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RotationSecret(**redacted**)")
    }
}

impl Drop for RotationSecret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a numeric one-time code of [`MAGIC_CODE_DIGITS`] digits.
#[must_use]
pub fn generate_magic_code() -> String {
    (0..MAGIC_CODE_DIGITS)
        .map(|_| char::from(b'0' + OsRng.gen_range(0..10_u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_secret_has_fixed_alphanumeric_length() {
        let secret = RotationSecret::generate();

        assert_eq!(secret.expose().len(), ROTATION_SECRET_LEN);
        assert!(secret.expose().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn rotation_secrets_differ_between_calls() {
        assert_ne!(
            RotationSecret::generate().expose(),
            RotationSecret::generate().expose()
        );
    }

    #[test]
    fn rotation_secret_debug_is_redacted() {
        let secret = RotationSecret::from("hunter2hunter2ab".to_string());

        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn magic_code_is_six_digits() {
        let code = generate_magic_code();

        assert_eq!(code.len(), MAGIC_CODE_DIGITS);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
