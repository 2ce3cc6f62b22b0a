/// Current-user session and the authentication gateway
///
/// Authentication is an external collaborator: the core consumes it through
/// the narrow [`AuthGateway`] interface and receives a [`CurrentUser`] - the
/// owner identity that is then passed *explicitly* into the task store and
/// drag controller. There is no ambient current-user global; watching the
/// session slot is how a caller reacts to sign-in/out.
///
/// [`HttpAuthGateway`] implements the interface over the Driftboard API:
/// email/password login, Google ID-token sign-in, and token refresh.
/// Provider failures surface as [`StoreError::Auth`] with the provider's
/// code/message pair. Logout is local (token discard) - there is nothing to
/// revoke server-side.
///
/// # Example
///
/// ```no_run
/// use driftboard_client::session::{AuthGateway, HttpAuthGateway};
///
/// # async fn example() -> Result<(), driftboard_shared::error::StoreError> {
/// let gateway = HttpAuthGateway::new("http://localhost:8080");
///
/// let user = gateway.sign_in_with_email("user@example.com", "hunter2hunter2").await?;
/// println!("signed in as {} ({})", user.email, user.identity);
///
/// gateway.logout().await?;
/// assert!(gateway.current_user().is_none());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use driftboard_shared::error::{StoreError, StoreResult};
use serde::Deserialize;
use std::sync::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

/// The signed-in user, as exposed by the auth collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    /// Stable owner identity; scopes every store call
    pub identity: Uuid,

    /// Account email
    pub email: String,

    /// Optional display name
    pub display_name: Option<String>,

    /// Optional profile picture URL
    pub photo_url: Option<String>,
}

/// Access/refresh token pair held for API calls
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Short-lived bearer token for API requests
    pub access_token: String,

    /// Long-lived token for obtaining fresh access tokens
    pub refresh_token: String,
}

/// The authentication collaborator interface
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Signs in with email and password
    ///
    /// # Errors
    ///
    /// `StoreError::Auth` with the provider's code/message on rejection.
    async fn sign_in_with_email(&self, email: &str, password: &str) -> StoreResult<CurrentUser>;

    /// Signs in with a Google ID token
    ///
    /// # Errors
    ///
    /// `StoreError::Auth` with the provider's code/message on rejection.
    async fn sign_in_with_google(&self, id_token: &str) -> StoreResult<CurrentUser>;

    /// Signs out, clearing the session slot
    async fn logout(&self) -> StoreResult<()>;

    /// The currently signed-in user, if any
    fn current_user(&self) -> Option<CurrentUser>;

    /// A watchable view of the session slot (fires on sign-in/out)
    fn watch(&self) -> watch::Receiver<Option<CurrentUser>>;
}

/// Successful auth response from the API
#[derive(Debug, Deserialize)]
struct AuthResponse {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    access_token: String,
    refresh_token: String,
}

/// Refresh response from the API
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Error payload shape the API returns on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// [`AuthGateway`] over the Driftboard API
pub struct HttpAuthGateway {
    http: reqwest::Client,
    base_url: String,
    current: watch::Sender<Option<CurrentUser>>,
    tokens: Mutex<Option<SessionTokens>>,
}

impl HttpAuthGateway {
    /// Creates a gateway pointed at an API base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            current,
            tokens: Mutex::new(None),
        }
    }

    /// The access token for authenticated API calls, if signed in
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .expect("session token lock poisoned")
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Exchanges the refresh token for a fresh access token
    ///
    /// # Errors
    ///
    /// `StoreError::Auth` if no session is active or the refresh is
    /// rejected.
    pub async fn refresh(&self) -> StoreResult<()> {
        let refresh_token = {
            let tokens = self.tokens.lock().expect("session token lock poisoned");
            tokens
                .as_ref()
                .map(|t| t.refresh_token.clone())
                .ok_or_else(|| StoreError::auth("auth/no-session", "not signed in"))?
        };

        let response = self
            .http
            .post(format!("{}/v1/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(network_error)?;

        let refreshed: RefreshResponse = parse_response(response).await?;

        let mut tokens = self.tokens.lock().expect("session token lock poisoned");
        if let Some(tokens) = tokens.as_mut() {
            tokens.access_token = refreshed.access_token;
        }
        Ok(())
    }

    async fn sign_in(&self, path: &str, body: serde_json::Value) -> StoreResult<CurrentUser> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let auth: AuthResponse = parse_response(response).await?;

        let user = CurrentUser {
            identity: auth.user_id,
            email: auth.email,
            display_name: auth.display_name,
            photo_url: auth.photo_url,
        };

        *self.tokens.lock().expect("session token lock poisoned") = Some(SessionTokens {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
        });
        let _ = self.current.send(Some(user.clone()));

        tracing::info!(user_id = %user.identity, "Signed in");
        Ok(user)
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_in_with_email(&self, email: &str, password: &str) -> StoreResult<CurrentUser> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(StoreError::invalid_input(
                "email and password must not be empty",
            ));
        }

        self.sign_in(
            "/v1/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_in_with_google(&self, id_token: &str) -> StoreResult<CurrentUser> {
        if id_token.trim().is_empty() {
            return Err(StoreError::invalid_input("id token must not be empty"));
        }

        self.sign_in(
            "/v1/auth/google",
            serde_json::json!({ "id_token": id_token }),
        )
        .await
    }

    async fn logout(&self) -> StoreResult<()> {
        *self.tokens.lock().expect("session token lock poisoned") = None;
        let _ = self.current.send(None);
        tracing::info!("Signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<CurrentUser> {
        self.current.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.current.subscribe()
    }
}

fn network_error(err: reqwest::Error) -> StoreError {
    StoreError::auth("auth/network", err.to_string())
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> StoreResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| StoreError::auth("auth/bad-response", e.to_string()));
    }

    // Failed sign-ins carry the provider code/message pair in the body.
    match response.json::<ErrorBody>().await {
        Ok(body) => Err(StoreError::auth(body.error, body.message)),
        Err(_) => Err(StoreError::auth(
            "auth/http-error",
            format!("request failed with status {}", status),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_gateway_has_no_session() {
        let gateway = HttpAuthGateway::new("http://localhost:8080");
        assert!(gateway.current_user().is_none());
        assert!(gateway.access_token().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies_watchers() {
        let gateway = HttpAuthGateway::new("http://localhost:8080");
        let mut watcher = gateway.watch();

        gateway.logout().await.unwrap();
        assert!(gateway.current_user().is_none());
        assert_eq!(*watcher.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_locally() {
        let gateway = HttpAuthGateway::new("http://localhost:8080");

        let result = gateway.sign_in_with_email("", "password1").await;
        assert!(matches!(result.unwrap_err(), StoreError::InvalidInput(_)));

        let result = gateway.sign_in_with_google("   ").await;
        assert!(matches!(result.unwrap_err(), StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_session_fails() {
        let gateway = HttpAuthGateway::new("http://localhost:8080");
        let result = gateway.refresh().await;
        assert!(matches!(result.unwrap_err(), StoreError::Auth { .. }));
    }

    #[test]
    fn test_error_body_shape() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"unauthorized","message":"Invalid credentials"}"#)
                .unwrap();
        assert_eq!(body.error, "unauthorized");
        assert_eq!(body.message, "Invalid credentials");
    }
}
