use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, password_hash, name, created_at, updated_at";

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Creates an account. Duplicate usernames are rejected with the same
/// message whether caught by the pre-check or by the unique constraint.
pub async fn register_user(
    pool: &SqlitePool,
    username: &str,
    email: Option<String>,
    name: Option<String>,
    password: String,
) -> AppResult<User> {
    if get_user_by_username(pool, username).await?.is_some() {
        tracing::info!(username, "registration failed: username already exists");
        return Err(AppError::InvalidInput("Username already registered".to_string()));
    }

    let password_hash = auth::hash_password(password)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password_hash, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::InvalidInput("Username already registered".to_string())
        }
        other => AppError::Database(other),
    })?;

    Ok(user)
}

/// Verifies credentials and returns the account. The error message does
/// not distinguish a missing user from a bad password.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: String) -> AppResult<User> {
    let user = get_user_by_username(pool, username).await?.ok_or_else(|| {
        tracing::info!(username, "authentication failed: user not found");
        AppError::Unauthorized("Incorrect username or password".to_string())
    })?;

    let valid = auth::verify_password(password, user.password_hash.clone())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        tracing::info!(username, "authentication failed: invalid password");
        return Err(AppError::Unauthorized("Incorrect username or password".to_string()));
    }

    Ok(user)
}

/// Partial profile update; username and email must stay unique across
/// other accounts.
pub async fn update_user(
    pool: &SqlitePool,
    user_id: i64,
    username: Option<String>,
    email: Option<String>,
    name: Option<String>,
) -> AppResult<User> {
    let mut user = get_user_by_id(pool, user_id).await?.ok_or_else(|| {
        AppError::Unauthorized("Could not validate credentials".to_string())
    })?;

    if let Some(new_username) = username {
        if new_username != user.username {
            if get_user_by_username(pool, &new_username).await?.is_some() {
                return Err(AppError::InvalidInput("Username already registered".to_string()));
            }
            user.username = new_username;
        }
    }

    if let Some(new_email) = email {
        if user.email.as_deref() != Some(new_email.as_str()) {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
            )
            .bind(&new_email)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
            if taken > 0 {
                return Err(AppError::InvalidInput("Email already registered".to_string()));
            }
            user.email = Some(new_email);
        }
    }

    if let Some(new_name) = name {
        user.name = Some(new_name);
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET username = ?1, email = ?2, name = ?3, updated_at = ?4
         WHERE id = ?5
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.name)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn change_password(
    pool: &SqlitePool,
    user_id: i64,
    current_password: String,
    new_password: String,
) -> AppResult<User> {
    let user = get_user_by_id(pool, user_id).await?.ok_or_else(|| {
        AppError::Unauthorized("Could not validate credentials".to_string())
    })?;

    let valid = auth::verify_password(current_password, user.password_hash.clone())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::InvalidInput("Current password is incorrect".to_string()));
    }

    let password_hash = auth::hash_password(new_password)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Deletes the account; preference, blacklist, and favorite rows cascade.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}
