// Argon2 password hashing for stored user records.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AuthError;

/// Verified against when no user matches, so unknown emails cost a full hash check.
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| hash_password("rover-decoy-password").unwrap_or_default())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// A stored hash that fails to parse never matches.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hashes on the blocking pool so argon2 never stalls the runtime.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
}

/// Checks `password` against `stored`, or against a decoy hash when there is
/// no stored user. Runs on the blocking pool.
pub async fn verify_password_blocking(password: String, stored: Option<String>) -> bool {
    let outcome = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => {
            verify_password(&password, decoy_hash());
            false
        }
    })
    .await;
    outcome.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_original_password() {
        let hash = hash_password("open sesame").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("open sesame", &hash));
        assert!(!verify_password("open sesame!", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext-password"));
    }

    #[test]
    fn decoy_hash_is_a_real_argon2_hash() {
        assert!(decoy_hash().starts_with("$argon2"));
        assert!(PasswordHash::new(decoy_hash()).is_ok());
    }

    #[tokio::test]
    async fn blocking_helpers_match_sync_versions() {
        let hash = hash_password_blocking("open sesame".to_string()).await.unwrap();
        assert!(verify_password_blocking("open sesame".to_string(), Some(hash.clone())).await);
        assert!(!verify_password_blocking("nope".to_string(), Some(hash)).await);
        assert!(!verify_password_blocking("rover-decoy-password".to_string(), None).await);
    }
}
