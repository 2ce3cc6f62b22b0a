/// Authentication utilities
///
/// - `jwt`: HS256 access/refresh token creation and validation
/// - `password`: Argon2id hashing, verification and strength checks
/// - `middleware`: bearer extraction and the per-request `AuthContext`

pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::{authenticate, AuthContext, AuthError};
