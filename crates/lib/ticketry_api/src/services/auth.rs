//! Authentication service — login/register flows delegating to
//! `ticketry_core::auth`.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LogoutResponse, TokenResponse};
use ticketry_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, generate_access_token};
use ticketry_core::auth::{password, queries};
use ticketry_core::tracker::UserRef;

/// Refresh token lifetime: 30 days.
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Refresh token generation & hashing
// ---------------------------------------------------------------------------

/// Generate a cryptographically random refresh token (64 alphanumeric chars).
fn generate_refresh_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a refresh token for storage.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build a `TokenResponse` from user data plus a fresh token pair.
fn build_token_response(
    user_id: Uuid,
    name: &str,
    email: &str,
    access_token: String,
    refresh_token: String,
) -> TokenResponse {
    TokenResponse {
        access_token,
        refresh_token,
        expires_in: ACCESS_TOKEN_EXPIRY_SECS,
        token_type: "Bearer".to_string(),
        user: UserRef {
            id: user_id,
            name: name.to_string(),
            email: email.to_string(),
        },
    }
}

/// Issue and persist a new refresh token for the user.
async fn issue_refresh_token(pool: &PgPool, user_id: &Uuid) -> AppResult<String> {
    let refresh_token = generate_refresh_token();
    let token_hash = hash_refresh_token(&refresh_token);
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);
    queries::store_refresh_token(pool, &token_hash, user_id, expires_at).await?;
    Ok(refresh_token)
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password_input: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let row = queries::find_user_by_email(pool, email).await?;

    let (user_id, name, pw_hash) = match row {
        // Generic error: don't reveal whether the email exists.
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(r) => r,
    };

    if !password::verify_password(password_input, &pw_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let access_token = generate_access_token(&user_id.to_string(), email, jwt_secret)?;
    let refresh_token = issue_refresh_token(pool, &user_id).await?;

    Ok(build_token_response(
        user_id,
        &name,
        email,
        access_token,
        refresh_token,
    ))
}

/// Register a new user account.
pub async fn register(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_input: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if password_input.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if queries::email_exists(pool, email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let pw_hash = password::hash_password(password_input)?;
    let user_id = queries::create_user(pool, name, email, &pw_hash).await?;

    info!(email, "registered new user");

    let access_token = generate_access_token(&user_id.to_string(), email, jwt_secret)?;
    let refresh_token = issue_refresh_token(pool, &user_id).await?;

    Ok(build_token_response(
        user_id,
        name,
        email,
        access_token,
        refresh_token,
    ))
}

/// Refresh an access token using a refresh token (single-use rotation).
pub async fn refresh(
    pool: &PgPool,
    refresh_token: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let token_hash = hash_refresh_token(refresh_token);

    let row = queries::find_valid_refresh_token(pool, &token_hash).await?;

    let (token_id, user_id) = match row {
        None => return Err(AppError::Unauthorized("Invalid refresh token".into())),
        Some(r) => r,
    };

    // Single use: the presented token is revoked before a new pair is issued.
    queries::revoke_refresh_token(pool, &token_id).await?;

    let user = queries::get_user_by_id(pool, &user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let access_token = generate_access_token(&user_id.to_string(), &user.email, jwt_secret)?;
    let new_refresh = issue_refresh_token(pool, &user_id).await?;

    Ok(build_token_response(
        user_id,
        &user.name,
        &user.email,
        access_token,
        new_refresh,
    ))
}

/// Logout — revoke a specific refresh token.
pub async fn logout(pool: &PgPool, refresh_token: Option<&str>) -> AppResult<LogoutResponse> {
    if let Some(token) = refresh_token {
        let token_hash = hash_refresh_token(token);
        queries::revoke_refresh_token_by_hash(pool, &token_hash).await?;
    }
    Ok(LogoutResponse { success: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_long_and_unique() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn refresh_token_hash_is_stable_hex() {
        let hash = hash_refresh_token("some-token");
        assert_eq!(hash, hash_refresh_token("some-token"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
