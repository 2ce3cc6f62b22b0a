/// User model and database operations
///
/// Users own tasks; every task query is scoped by `user_id`. Accounts come
/// from either email/password signup (Argon2id hash) or Google sign-in
/// (provider account with an empty hash sentinel).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE auth_provider AS ENUM ('password', 'google');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL DEFAULT '',
///     provider auth_provider NOT NULL DEFAULT 'password',
///     display_name VARCHAR(255),
///     photo_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::models::user::{AuthProvider, CreateUser, User};
/// use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     provider: AuthProvider::Password,
///     display_name: Some("Alex".to_string()),
///     photo_url: None,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// How an account authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email + Argon2id password
    Password,

    /// Google ID token sign-in
    Google,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash; empty string for provider-only accounts
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// How this account signs in
    pub provider: AuthProvider,

    /// Optional display name
    pub display_name: Option<String>,

    /// Optional profile picture URL
    pub photo_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last signed in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (empty string for provider accounts)
    pub password_hash: String,

    /// Sign-in provider
    pub provider: AuthProvider,

    /// Optional display name
    pub display_name: Option<String>,

    /// Optional profile picture URL
    pub photo_url: Option<String>,
}

const USER_COLUMNS: &str = "id, email, password_hash, provider, display_name, photo_url, \
                            created_at, updated_at, last_login_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the insert fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, provider, display_name, photo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.provider)
        .bind(data.display_name)
        .bind(data.photo_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates profile fields delivered by a sign-in provider
    ///
    /// Used on every Google sign-in so a changed name or picture propagates.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        display_name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                photo_url = COALESCE($3, photo_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(display_name)
        .bind(photo_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stamps a successful sign-in
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user (cascades to their tasks)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
