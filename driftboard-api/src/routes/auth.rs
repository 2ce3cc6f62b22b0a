/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Email/password signup
/// - `POST /v1/auth/login` - Email/password sign-in
/// - `POST /v1/auth/google` - Google ID-token sign-in
/// - `POST /v1/auth/refresh` - Refresh the access token
///
/// Successful sign-ins return the user profile plus an access/refresh token
/// pair; failures return the standard error body whose `error`/`message`
/// pair the client surfaces as the provider code and message.

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use driftboard_shared::{
    auth::{jwt, password},
    models::user::{AuthProvider, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Google sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleRequest {
    /// Google-issued ID token from the browser sign-in flow
    #[validate(length(min = 1, message = "ID token must not be empty"))]
    pub id_token: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token from a previous sign-in
    pub refresh_token: String,
}

/// Sign-in response: the user profile plus a token pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// User ID - the owner identity for every task call
    pub user_id: String,

    /// Account email
    pub email: String,

    /// Display name, if set
    pub display_name: Option<String>,

    /// Profile picture URL, if set
    pub photo_url: Option<String>,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Claims Google's tokeninfo endpoint returns for a valid ID token
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    /// Audience - must match our OAuth client id
    aud: String,

    /// Account email
    email: String,

    /// "true"/"false" as a string, per the tokeninfo wire format
    #[serde(default)]
    email_verified: String,

    /// Display name
    #[serde(default)]
    name: Option<String>,

    /// Profile picture URL
    #[serde(default)]
    picture: Option<String>,
}

fn issue_tokens(state: &AppState, user: &User) -> ApiResult<(String, String)> {
    let access_claims = jwt::Claims::new(user.id, &user.email, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, &user.email, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok((access_token, refresh_token))
}

fn auth_response(state: &AppState, user: &User) -> ApiResult<Json<AuthResponse>> {
    let (access_token, refresh_token) = issue_tokens(state, user)?;

    Ok(Json(AuthResponse {
        user_id: user.id.to_string(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        photo_url: user.photo_url.clone(),
        access_token,
        refresh_token,
    }))
}

/// Registers a new email/password user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation or password strength failed
/// - `409 Conflict`: email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(validation_errors)?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            provider: AuthProvider::Password,
            display_name: req.display_name,
            photo_url: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");
    auth_response(&state, &user)
}

/// Signs a user in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable
///   on purpose)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    auth_response(&state, &user)
}

/// Signs a user in with a Google ID token
///
/// The token is verified against Google's tokeninfo endpoint: the audience
/// must match our OAuth client id and the email must be verified. First
/// sign-in creates the account; later sign-ins refresh the profile fields
/// Google delivers.
///
/// # Errors
///
/// - `503 Service Unavailable`: GOOGLE_CLIENT_ID is not configured
/// - `401 Unauthorized`: the token is invalid, expired, or for a different
///   audience
pub async fn google(
    State(state): State<AppState>,
    Json(req): Json<GoogleRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(validation_errors)?;

    let client_id = state.config.google.client_id.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
    })?;

    let info = verify_google_token(&req.id_token).await?;

    if &info.aud != client_id {
        return Err(ApiError::Unauthorized(
            "ID token issued for a different client".to_string(),
        ));
    }
    if info.email_verified != "true" {
        return Err(ApiError::Unauthorized(
            "Google account email is not verified".to_string(),
        ));
    }

    let user = match User::find_by_email(&state.db, &info.email).await? {
        Some(existing) => User::update_profile(&state.db, existing.id, info.name, info.picture)
            .await?
            .unwrap_or(existing),
        None => {
            User::create(
                &state.db,
                CreateUser {
                    email: info.email,
                    password_hash: String::new(),
                    provider: AuthProvider::Google,
                    display_name: info.name,
                    photo_url: info.picture,
                },
            )
            .await?
        }
    };

    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User signed in with Google");
    auth_response(&state, &user)
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: the refresh token is invalid, expired, or an
///   access token was presented instead
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let access_claims = jwt::Claims::new(claims.sub, &claims.email, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Asks Google's tokeninfo endpoint to validate an ID token
///
/// A non-200 response means the token is invalid or expired.
async fn verify_google_token(id_token: &str) -> Result<GoogleTokenInfo, ApiError> {
    let response = reqwest::Client::new()
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Google tokeninfo unreachable: {}", e)))?;

    if !response.status().is_success() {
        return Err(ApiError::Unauthorized(
            "Invalid or expired Google ID token".to_string(),
        ));
    }

    response
        .json::<GoogleTokenInfo>()
        .await
        .map_err(|e| ApiError::InternalError(format!("Malformed tokeninfo response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "user@example.com".to_string(),
            password: "password1".to_string(),
            display_name: Some("Alex".to_string()),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "password1".to_string(),
            display_name: None,
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            email: "user@example.com".to_string(),
            password: "short".to_string(),
            display_name: None,
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_google_request_validation() {
        assert!(GoogleRequest {
            id_token: String::new()
        }
        .validate()
        .is_err());
        assert!(GoogleRequest {
            id_token: "token".to_string()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_tokeninfo_deserialization() {
        let info: GoogleTokenInfo = serde_json::from_str(
            r#"{
                "aud": "client-123.apps.googleusercontent.com",
                "email": "user@gmail.com",
                "email_verified": "true",
                "name": "User Name",
                "picture": "https://example.com/p.jpg",
                "sub": "10769150350006150715113082367"
            }"#,
        )
        .unwrap();

        assert_eq!(info.aud, "client-123.apps.googleusercontent.com");
        assert_eq!(info.email_verified, "true");
        assert_eq!(info.name.as_deref(), Some("User Name"));
    }
}
