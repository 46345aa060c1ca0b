//! Signed, time-limited bearer tokens.
//!
//! Tokens are JWTs signed with HMAC-SHA256 using the process-wide secret
//! from [`AuthConfig`]. A token embeds the subject identity and an expiry
//! timestamp; validation fails closed on any signature mismatch, malformed
//! payload, or missing claim. There is no revocation list, so a token
//! stays valid until its natural expiry.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthError};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject identity (username).
    sub: String,
    /// Expiry as seconds since the Unix epoch.
    exp: i64,
}

/// Issues and validates access tokens.
///
/// Keys are derived once from the shared secret at construction; the
/// service is cheap to clone and safe to share across request tasks.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: chrono::Duration,
}

impl TokenService {
    /// Create a token service from authentication configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is invalid at its boundary, no leeway.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            token_ttl: chrono::Duration::from_std(config.token_ttl)
                .unwrap_or_else(|_| chrono::Duration::minutes(30)),
        }
    }

    /// Issue a token for `subject`, expiring after the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_with_lifetime(subject, self.token_ttl)
    }

    /// Issue a token with an explicit lifetime.
    ///
    /// A zero or negative lifetime produces an already-expired token,
    /// which the expiry tests rely on.
    pub fn issue_with_lifetime(
        &self,
        subject: &str,
        lifetime: chrono::Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (chrono::Utc::now() + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Validate a token and extract the subject identity.
    ///
    /// # Errors
    /// - [`AuthError::Expired`] when the signature is valid but the expiry
    ///   has passed
    /// - [`AuthError::InvalidToken`] for every other failure mode
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims.sub)
    }
}
