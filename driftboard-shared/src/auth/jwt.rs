/// JWT token generation and validation
///
/// HS256-signed tokens carrying the user's identity. Two token types:
/// short-lived access tokens for API calls and long-lived refresh tokens for
/// obtaining new access tokens without re-entering credentials.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours for access, 30 days for refresh
/// - **Validation**: signature, expiration, not-before, and issuer checks
/// - **Secret**: at least 32 bytes, from the JWT_SECRET environment variable
///
/// # Example
///
/// ```
/// use driftboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, "user@example.com", TokenType::Access);
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes!!")?;
///
/// let validated = validate_token(&token, "a-secret-that-is-at-least-32-bytes!!")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer baked into every claim set
const ISSUER: &str = "driftboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid token format
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// Wrong token type for the operation (e.g. refresh where access needed)
    #[error("Wrong token type: expected {expected}")]
    WrongTokenType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, 24 hours)
    Access,

    /// Refresh token (long-lived, 30 days)
    Refresh,
}

impl TokenType {
    /// Default expiration duration for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the account
/// email and the token type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "driftboard"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Account email (custom claim)
    pub email: String,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for the token type
    pub fn new(user_id: Uuid, email: &str, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, email, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration
    pub fn with_expiration(
        user_id: Uuid,
        email: &str,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            email: email.to_string(),
            token_type,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a JWT string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates a JWT string and returns its claims
///
/// Checks signature, expiration, not-before, and issuer.
///
/// # Errors
///
/// - `JwtError::Expired` for expired tokens
/// - `JwtError::ValidationError` for bad signatures or issuers
/// - `JwtError::InvalidFormat` for malformed tokens
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => {
            JwtError::InvalidFormat(e.to_string())
        }
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token and additionally requires it to be an access token
///
/// # Errors
///
/// `JwtError::WrongTokenType` if a refresh token was presented.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType { expected: "access" });
    }
    Ok(claims)
}

/// Validates a token and additionally requires it to be a refresh token
///
/// # Errors
///
/// `JwtError::WrongTokenType` if an access token was presented.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType { expected: "refresh" });
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-with-enough-bytes!!!";

    #[test]
    fn test_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@b.c", TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email, "a@b.c");
        assert_eq!(validated.iss, "driftboard");
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "another-secret-of-sufficient-size!!!");
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "a@b.c",
            TokenType::Access,
            Duration::seconds(-120),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);
        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_access_guard_rejects_refresh_token() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_refresh_token(&token, SECRET).is_ok());
        assert!(matches!(
            validate_access_token(&token, SECRET).unwrap_err(),
            JwtError::WrongTokenType { expected: "access" }
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }
}
