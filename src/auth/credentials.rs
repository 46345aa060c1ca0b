//! Credential store backed by the user repository.
//!
//! Registration hashes the plaintext before it ever reaches the
//! repository; verification looks the user up by username and compares
//! digests. Both a missing user and a digest mismatch yield
//! [`AuthError::InvalidCredentials`].

use super::password::{hash_password, verify_password};
use super::AuthError;
use crate::db::repository::{RepositoryResult, UserRepository};
use crate::models::{NewUser, User};

/// Register a new user with a plaintext password.
///
/// The password is digested before storage. Fails with a `Conflict`
/// repository error when the email is already in use.
pub async fn register(
    repo: &dyn UserRepository,
    username: &str,
    email: &str,
    password: &str,
) -> RepositoryResult<User> {
    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        hashed_password: hash_password(password),
    };
    repo.create_user(new_user).await
}

/// Verify a username/password pair and return the matching user.
///
/// Lookup is by username, not email. The error does not distinguish an
/// unknown username from a wrong password.
pub async fn verify(
    repo: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = repo
        .find_user_by_username(username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.hashed_password) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}
