use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Stands in for a stored hash when the account does not exist, so a failed login costs one
/// argon2 verify either way. Same algorithm and cost parameters as [`hash_password`].
pub const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$TwKk3rwyZOXnTuC335Ny/g$rDwztzd7tmX8QwuEYK4AEgWDUCYrp/11lKh70pD+cDU";

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a password with Argon2id. The PHC output embeds a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string. Unparseable hashes simply fail.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
