//! Moderator credential verification
//!
//! The moderator password comes from configuration either as plain text or
//! as an Argon2id PHC string (`$argon2id$...`). Both paths compare in
//! constant time or through the Argon2 verifier.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::crypto::constant_time_eq;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Configured moderator secret
#[derive(Clone, PartialEq, Eq)]
pub enum StoredPassword {
    Plain(String),
    Argon2(String),
}

impl StoredPassword {
    /// Interpret a configured value, PHC strings become [`StoredPassword::Argon2`]
    pub fn from_config(value: &str) -> Self {
        if value.starts_with("$argon2") {
            StoredPassword::Argon2(value.to_string())
        } else {
            StoredPassword::Plain(value.to_string())
        }
    }

    pub fn verify(&self, candidate: &str) -> Result<bool, PasswordError> {
        match self {
            StoredPassword::Plain(expected) => {
                Ok(constant_time_eq(expected.as_bytes(), candidate.as_bytes()))
            }
            StoredPassword::Argon2(phc) => {
                let parsed =
                    PasswordHash::new(phc).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
                Ok(Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok())
            }
        }
    }
}

impl std::fmt::Debug for StoredPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredPassword::Plain(_) => f.write_str("StoredPassword::Plain(***)"),
            StoredPassword::Argon2(_) => f.write_str("StoredPassword::Argon2(***)"),
        }
    }
}

/// Hash a password into an Argon2id PHC string for `ADMIN_PASSWORD`
pub fn hash_password(raw: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_password() {
        let stored = StoredPassword::from_config("s3cret");
        assert!(matches!(stored, StoredPassword::Plain(_)));
        assert!(stored.verify("s3cret").unwrap());
        assert!(!stored.verify("s3cret ").unwrap());
    }

    #[test]
    fn test_argon2_password() {
        let phc = hash_password("moderate-me").unwrap();
        let stored = StoredPassword::from_config(&phc);
        assert!(matches!(stored, StoredPassword::Argon2(_)));
        assert!(stored.verify("moderate-me").unwrap());
        assert!(!stored.verify("wrong").unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        for phc in ["", "not-a-phc-string"] {
            let stored = StoredPassword::Argon2(phc.to_string());
            assert!(matches!(
                stored.verify("x"),
                Err(PasswordError::MalformedHash(_))
            ));
        }
    }

    #[test]
    fn test_hash_without_digest_never_matches() {
        let stored = StoredPassword::from_config("$argon2id$broken");
        assert_eq!(stored.verify("x"), Ok(false));
    }

    #[test]
    fn test_debug_hides_secret() {
        let stored = StoredPassword::from_config("hunter2");
        assert!(!format!("{stored:?}").contains("hunter2"));
    }
}
