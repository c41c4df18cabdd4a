use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::config::Config;
use crate::error::AppError;

const TOKEN_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    sub: i64,
    exp: i64,
}

/// The authenticated caller, extracted from the `Authorization` header.
/// Using it as a handler argument makes the endpoint require a valid token.
pub struct AuthUser {
    pub id: i64,
}

/// Optional-authentication extractor: anonymous callers and callers with
/// an invalid token both resolve to `None` instead of being rejected.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix(TOKEN_PREFIX)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Could not validate credentials".to_string())
        })?;
        let id = verify_token(&state.config, token)?;
        Ok(AuthUser { id })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = bearer_token(parts)
            .and_then(|token| verify_token(&state.config, token).ok())
            .map(|id| AuthUser { id });
        Ok(MaybeUser(user))
    }
}

/// Issues a signed bearer token for the given user id
pub fn issue_token(config: &Config, user_id: i64) -> anyhow::Result<String> {
    let expiry = Utc::now() + Duration::minutes(config.token_expire_minutes);
    let claim = AuthClaim {
        sub: user_id,
        exp: expiry.timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .context("Failed to generate bearer token")
}

/// Verifies a bearer token and returns the user id it was issued for
pub fn verify_token(config: &Config, token: &str) -> Result<i64, AppError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "token validation failed");
        AppError::Unauthorized("Could not validate credentials".to_string())
    })?;

    let claim = token_data.claims;
    if claim.exp < Utc::now().timestamp() {
        return Err(AppError::Unauthorized("Token expired".to_string()));
    }
    Ok(claim.sub)
}

/// Hashes a password with argon2 on a blocking thread
pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

/// Verifies a password against its stored argon2 hash
pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let config = Config::default();
        let token = issue_token(&config, 42).unwrap();
        assert_eq!(verify_token(&config, &token).unwrap(), 42);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let config = Config::default();
        let token = issue_token(&config, 42).unwrap();

        let other = Config {
            jwt_secret: "a-different-secret".to_string(),
            ..Config::default()
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = Config::default();
        assert!(verify_token(&config, "not-a-token").is_err());
    }

    #[tokio::test]
    async fn test_password_hash_roundtrip() {
        let hash = hash_password("pass".to_string()).await.unwrap();
        assert!(verify_password("pass".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
