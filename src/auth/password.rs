// Password hashing and verification

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::auth::error::AuthError;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a random salt.
    /// Output is a PHC string carrying the salt and cost parameters, so
    /// verification stays stable across calls within the same deployment.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    }

    /// Verify a password against a stored hash.
    /// A malformed digest verifies as false rather than erroring; the
    /// caller only ever learns match / no-match.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hash = PasswordService::hash_password("binhmai123").unwrap();
        assert!(PasswordService::verify_password("binhmai123", &hash));
    }

    #[test]
    fn test_wrong_password_fails_verification() {
        let hash = PasswordService::hash_password("correct horse").unwrap();
        assert!(!PasswordService::verify_password("battery staple", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = PasswordService::hash_password("p1").unwrap();
        let b = PasswordService::hash_password("p1").unwrap();
        assert_ne!(a, b, "two hashes of the same password must use distinct salts");
        assert!(PasswordService::verify_password("p1", &a));
        assert!(PasswordService::verify_password("p1", &b));
    }

    #[test]
    fn test_malformed_digest_verifies_false() {
        assert!(!PasswordService::verify_password("p1", ""));
        assert!(!PasswordService::verify_password("p1", "not-a-phc-string"));
        assert!(!PasswordService::verify_password("p1", "$argon2id$garbage"));
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hash = PasswordService::hash_password("supersecretpw").unwrap();
        assert!(!hash.contains("supersecretpw"));
    }
}
