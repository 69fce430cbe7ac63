//! Password hashing. Stored hashes are argon2 PHC strings, so the salt and
//! parameters travel with the hash.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use bazaar_core::{BazaarError, Result};

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hashed: &str) -> Result<bool>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| BazaarError::Hash(format!("{e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hashed: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hashed).map_err(|e| BazaarError::Hash(format!("{e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
