use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

// Argon2id, 19 MiB memory, 2 passes, 1 lane.
const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

/// Stand-in hash for logins naming no account. Built with the same
/// parameters as real hashes so verifying against it costs the same.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("rolegate-no-such-account").ok());

fn hasher() -> Result<Argon2<'static>, String> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| format!("Invalid argon2 params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password with a fresh random salt. Returns a PHC string.
pub fn hash(plain: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Check a plaintext password against a stored PHC string. The cost
/// parameters are read from the stored hash, not from the constants above.
pub fn verify(plain: &str, stored: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored).map_err(|e| format!("Invalid hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Spend one verification's worth of work on a password that matches no
/// account, so an unknown email answers no faster than a wrong password.
pub fn verify_dummy(plain: &str) {
    if let Some(stored) = DUMMY_HASH.as_deref() {
        let _ = verify(plain, stored);
    }
}

pub fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH.as_deref()
}
