/// Store-facing error surface
///
/// This module defines the error type shared by every task-store adapter and
/// by the interaction core that drives it. The four kinds mirror the four
/// failure classes of the system:
///
/// - `InvalidInput`: a local precondition failed (missing owner, nil task id,
///   empty title). Rejected synchronously, before any network call.
/// - `Auth`: the authentication provider rejected a sign-in/out operation.
///   Carries the provider's code/message pair for display.
/// - `Subscription`: establishing or delivering the live board query failed.
/// - `Mutation`: a create/update/delete was rejected by the store
///   (permission, network, constraint).
///
/// None of these are fatal: the board is always re-derived from the latest
/// snapshot, so a failed mutation simply leaves the previous snapshot in
/// place and the user retries. No kind is retried automatically.
///
/// # Example
///
/// ```
/// use driftboard_shared::error::StoreError;
///
/// let err = StoreError::invalid_input("task id must not be nil");
/// assert!(matches!(err, StoreError::InvalidInput(_)));
/// ```

use serde::{Deserialize, Serialize};

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error type for store adapters and the interaction core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StoreError {
    /// A local argument check failed; nothing was sent to the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The auth provider reported a failure (sign-in, token exchange)
    #[error("Authentication failed ({code}): {message}")]
    Auth {
        /// Provider-specific error code (e.g. "auth/wrong-password")
        code: String,

        /// Human-readable provider message
        message: String,
    },

    /// The live board query could not be established or delivered
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// The store rejected a create/update/delete
    #[error("Mutation failed: {0}")]
    Mutation(String),
}

impl StoreError {
    /// Shorthand for `InvalidInput` from any displayable message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        StoreError::InvalidInput(msg.into())
    }

    /// Shorthand for `Auth` with a provider code and message
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Auth {
            code: code.into(),
            message: message.into(),
        }
    }

    /// True if the error never reached the network
    pub fn is_local(&self) -> bool {
        matches!(self, StoreError::InvalidInput(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Mutation(format!("database error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_local() {
        assert!(StoreError::invalid_input("missing owner").is_local());
        assert!(!StoreError::Mutation("rejected".to_string()).is_local());
        assert!(!StoreError::Subscription("closed".to_string()).is_local());
    }

    #[test]
    fn test_auth_display_includes_code() {
        let err = StoreError::auth("auth/wrong-password", "Wrong password");
        let text = err.to_string();
        assert!(text.contains("auth/wrong-password"));
        assert!(text.contains("Wrong password"));
    }
}
