//! Argon2 password hashing for stored user accounts.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::OnceLock;

use crate::error::{DbError, DbResult};

/// Hashes a password into a PHC string (`$argon2id$...`).
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Returns false for a wrong password or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Runs a full verification against a fixed throwaway hash.
///
/// Login calls this for unknown usernames so they cost the same argon2 work
/// as a wrong password. The result is always false.
pub fn verify_dummy(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| hash_password("tally-unknown-user").unwrap_or_default());
    std::hint::black_box(verify_password(password, hash));
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_dummy_verify_does_real_work_and_fails() {
        assert!(!verify_dummy("correct horse"));
        assert!(!verify_dummy("tally-unknown-user"));

        let before = std::time::Instant::now();
        verify_dummy("anything");
        let dummy = before.elapsed();

        let hash = hash_password("correct horse").unwrap();
        let before = std::time::Instant::now();
        verify_password("wrong horse", &hash);
        let real = before.elapsed();

        // Same argon2 parameters, so the costs are the same order of magnitude
        assert!(dummy * 10 > real, "dummy {:?} vs real {:?}", dummy, real);
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }
}
