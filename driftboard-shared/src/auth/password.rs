/// Password hashing and verification
///
/// Argon2id with explicit parameters, producing PHC string hashes that embed
/// the algorithm, parameters and salt. Plaintext passwords never touch the
/// database.
///
/// # Example
///
/// ```
/// use driftboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("correct horse battery staple", &hash)?);
/// assert!(!verify_password("wrong guess", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id
///
/// Parameters: 64 MB memory, 3 iterations, 4 lanes, 16-byte random salt,
/// 32-byte output.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a PHC hash string
///
/// Provider-only accounts store an empty hash sentinel; those never verify.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash string is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    if hash.is_empty() {
        return Ok(false);
    }

    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Validates password strength before hashing
///
/// Requires at least 8 characters with at least one letter and one digit.
/// Returns a human-readable message on failure, surfaced as a field-level
/// validation error by the API.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }
    Ok(())
}
