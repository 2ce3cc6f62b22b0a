/// Request authentication context
///
/// The pieces the API's auth middleware needs that are independent of any
/// web framework: the authenticated identity attached to a request, bearer
/// header parsing, and the error taxonomy. The axum wiring itself lives in
/// the API crate.
///
/// # Example
///
/// ```
/// use driftboard_shared::auth::middleware::bearer_token;
///
/// let token = bearer_token(Some("Bearer abc.def.ghi")).unwrap();
/// assert_eq!(token, "abc.def.ghi");
/// assert!(bearer_token(None).is_err());
/// ```

use crate::auth::jwt::{validate_access_token, Claims, JwtError};
use uuid::Uuid;

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials were presented
    #[error("Missing credentials")]
    MissingCredentials,

    /// The Authorization header is not a bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// The token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// The authenticated identity attached to a request
///
/// This is the owner identity every task query is scoped by. It is passed
/// explicitly into handlers - never read from ambient state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user ID - the task owner
    pub user_id: Uuid,

    /// Account email from the token claims
    pub email: String,
}

impl AuthContext {
    /// Builds the context from validated claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

/// Extracts the token from an Authorization header value
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if the header is absent
/// - `AuthError::InvalidFormat` if it is not `Bearer {token}`
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("expected 'Bearer {token}'".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("empty bearer token".to_string()));
    }

    Ok(token)
}

/// Authenticates an Authorization header value into an [`AuthContext`]
///
/// Requires an access token; refresh tokens are rejected.
///
/// # Errors
///
/// Propagates header-format errors and token validation failures.
pub fn authenticate(header: Option<&str>, jwt_secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header)?;

    let claims = validate_access_token(token, jwt_secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    Ok(AuthContext::from_claims(&claims))
}
