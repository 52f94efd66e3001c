//! Password hashing on top of Argon2id.
//!
//! The time cost comes from configuration so it can be tuned without a code
//! change. The KDF is deliberately slow, so the async wrappers run it on the
//! blocking pool instead of stalling the scheduler.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;

// Memory cost in KiB (64 MB) and lane count; only the time cost is tunable.
const MEMORY_COST_KIB: u32 = 65536;
const PARALLELISM: u32 = 4;

fn hasher(time_cost: u32) -> Result<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, time_cost.max(1), PARALLELISM, None)
        .map_err(|err| anyhow!("invalid Argon2 params: {err}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC string.
pub async fn hash(password: String, time_cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_blocking(&password, time_cost))
        .await
        .map_err(|err| anyhow!("password hashing task failed: {err}"))?
}

pub(crate) fn hash_blocking(password: &str, time_cost: u32) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = hasher(time_cost)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("password hashing failed: {err}"))?;
    Ok(digest.to_string())
}

/// Verify a password against a stored digest.
///
/// Returns `Ok(false)` on a mismatch; only infrastructure problems (a
/// malformed digest, a dead blocking pool) surface as errors.
pub async fn verify(password: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &digest))
        .await
        .map_err(|err| anyhow!("password verification task failed: {err}"))?
}

pub(crate) fn verify_blocking(password: &str, digest: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(digest).map_err(|err| anyhow!("invalid password digest: {err}"))?;

    // Parameters come from the digest itself, not from our config.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("password verification failed: {err}")),
    }
}
