use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest};
use super::jwt::{JwtKeys, TokenError};
use super::password::{hash_password, verify_password};
use super::repo_types::User;
use crate::error::{is_unique_violation, AppError};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken(#[source] TokenError),
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidEmail | AuthError::NameTooShort | AuthError::PasswordTooShort => {
                AppError::Validation(e.to_string())
            }
            AuthError::EmailTaken => AppError::Conflict(e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken(_) => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::UserNotFound => AppError::NotFound(e.to_string()),
            AuthError::Storage(e) => e.into(),
            AuthError::Internal(e) => AppError::Internal(e),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name(name: &str) -> Result<(), AuthError> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AuthError::NameTooShort);
    }
    Ok(())
}

/// Normalize and check a registration payload before anything is stored.
pub fn validate_registration(payload: &mut RegisterRequest) -> Result<(), AuthError> {
    payload.name = payload.name.trim().to_string();
    payload.email = normalize_email(&payload.email);

    validate_name(&payload.name)?;
    if !is_valid_email(&payload.email) {
        return Err(AuthError::InvalidEmail);
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_profile_update(payload: &mut UpdateProfileRequest) -> Result<(), AuthError> {
    if let Some(name) = payload.name.as_mut() {
        *name = name.trim().to_string();
        validate_name(name)?;
    }
    if let Some(avatar) = payload.avatar.as_mut() {
        *avatar = avatar.trim().to_string();
    }
    Ok(())
}

fn issue_pair(keys: &JwtKeys, user: User) -> Result<AuthResponse, AuthError> {
    let token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id, &user.email)?;
    Ok(AuthResponse {
        user: user.into(),
        token,
        refresh_token,
    })
}

pub async fn register(
    state: &AppState,
    mut payload: RegisterRequest,
) -> Result<AuthResponse, AuthError> {
    validate_registration(&mut payload)?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AuthError::EmailTaken);
    }

    let hash = hash_password(&payload.password)?;

    // A concurrent registration can still win the race; the unique index decides.
    let user = User::create(&state.db, &payload.name, &payload.email, &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Storage(e)
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue_pair(&state.jwt, user)
}

pub async fn login(state: &AppState, payload: LoginRequest) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(&payload.email);

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue_pair(&state.jwt, user)
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<AuthResponse, AuthError> {
    let claims = state
        .jwt
        .verify_refresh(refresh_token)
        .map_err(AuthError::InvalidRefreshToken)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    info!(user_id = %user.id, "token refreshed");
    issue_pair(&state.jwt, user)
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<User, AuthError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    mut payload: UpdateProfileRequest,
) -> Result<User, AuthError> {
    validate_profile_update(&mut payload)?;
    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        payload.avatar.as_deref(),
    )
    .await?
    .ok_or(AuthError::UserNotFound)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}
