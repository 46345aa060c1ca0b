//! Request extractors for authenticated endpoints.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::models::User;

/// Extractor that resolves the bearer token to the authenticated user.
///
/// Validates the `Authorization: Bearer <token>` header against the token
/// service, then loads the user named by the token subject. A token whose
/// user has since been deleted is rejected the same way as an invalid one.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .or_else(|| header_value.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let subject = state.tokens.validate(token)?;

        let user = state
            .repository
            .find_user_by_username(&subject)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(CurrentUser(user))
    }
}
