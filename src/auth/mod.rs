//! Authentication module: password digests, bearer tokens, credentials.
//!
//! Two cooperating pieces implement the login flow:
//!
//! - [`credentials`]: registers users and verifies username/password pairs
//!   against the user repository (the credential store is the `users`
//!   table, not an in-process map).
//! - [`token::TokenService`]: issues and validates signed, time-limited
//!   bearer tokens carrying the username as subject.
//!
//! The signing secret is process-wide configuration loaded once at startup
//! via [`AuthConfig::from_env`].

pub mod credentials;
pub mod password;
pub mod token;

pub use credentials::{register, verify};
pub use password::{hash_password, verify_password};
pub use token::TokenService;

use std::time::Duration;

use crate::db::repository::RepositoryError;

/// Default token lifetime: 30 minutes.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username unknown or password mismatch. Deliberately does not say
    /// which, so the login endpoint cannot leak username existence.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Signature mismatch, malformed payload, or missing subject claim.
    #[error("invalid token")]
    InvalidToken,

    /// Token signature is valid but the expiry has passed.
    #[error("token expired")]
    Expired,

    /// Underlying repository failure during credential resolution.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Authentication configuration loaded once at process startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for the symmetric token signature.
    pub secret: String,
    /// Token lifetime from issuance.
    pub token_ttl: Duration,
}

impl AuthConfig {
    /// Create a configuration with the default 30 minute token lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `AUTH_SECRET` (required): token signing secret
    /// - `AUTH_TOKEN_TTL_MINUTES` (optional, default: 30)
    pub fn from_env() -> Result<Self, String> {
        let secret = std::env::var("AUTH_SECRET")
            .map_err(|_| "AUTH_SECRET environment variable not set".to_string())?;
        if secret.is_empty() {
            return Err("AUTH_SECRET must not be empty".to_string());
        }

        let ttl_minutes = std::env::var("AUTH_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            secret,
            token_ttl: Duration::from_secs(ttl_minutes * 60),
        })
    }

    /// Override the token lifetime (used by expiry tests).
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}
