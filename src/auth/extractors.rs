use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Authenticated caller, available to any handler that lists it as an argument.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Authorization header required")]
    MissingHeader,
    #[error("Bearer token required")]
    MalformedHeader,
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<GuardError> for AppError {
    fn from(e: GuardError) -> Self {
        let msg = match e {
            GuardError::Token(TokenError::Expired) => "Token expired".to_string(),
            GuardError::Token(TokenError::WrongTokenType) => "Invalid token type".to_string(),
            GuardError::Token(_) => "Invalid token".to_string(),
            other => other.to_string(),
        };
        AppError::Unauthorized(msg)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GuardError> {
    let value = headers.get(AUTHORIZATION).ok_or(GuardError::MissingHeader)?;
    let value = value.to_str().map_err(|_| GuardError::MalformedHeader)?;

    let scheme = value.get(..7).ok_or(GuardError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return Err(GuardError::MalformedHeader);
    }
    let token = value[7..].trim();
    if token.is_empty() {
        return Err(GuardError::MalformedHeader);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!(reason = %e, "rejected authorization header");
            e
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "invalid or expired token");
            GuardError::Token(e)
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
