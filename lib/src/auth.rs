//! Operator authentication.
//!
//! There's exactly one set of credentials, defined in [`config::Admin`]. The
//! password may be configured in plain text or as an argon2 hash in PHC
//! string format, as produced by [`hash_password`].

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::config;
use crate::error::{ErrorKind, Result};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default().verify_password(password, &expected_password_hash)?;
    Ok(())
}

/// Checks provided credentials against the configured operator.
///
/// Fails with [`ErrorKind::Unauthorized`] regardless of which part didn't
/// match. An operator without a password can't be authenticated at all.
pub fn check_credentials(admin: &config::Admin, username: &str, password: Option<&str>) -> Result<()> {
    if admin.password.is_empty() {
        tracing::debug!("rejecting credentials, no operator password configured");
        return Err(ErrorKind::Unauthorized.into());
    }

    let password = password.unwrap_or_default();
    let username_matches = constant_time_eq(username.as_bytes(), admin.username.as_bytes());
    let password_matches = if admin.password.starts_with("$argon2") {
        validate_password(password.as_bytes(), &admin.password).is_ok()
    } else {
        constant_time_eq(password.as_bytes(), admin.password.as_bytes())
    };

    if username_matches && password_matches {
        Ok(())
    } else {
        Err(ErrorKind::Unauthorized.into())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
