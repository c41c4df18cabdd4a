use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::services::users;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// Handlers

/// Get the authenticated user's profile
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<User>> {
    let user = users::get_user_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;
    Ok(Json(user))
}

/// Partial update of the authenticated user's profile
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = users::update_user(
        &state.db,
        user.id,
        request.username,
        request.email,
        request.name,
    )
    .await?;
    Ok(Json(user))
}

/// Permanently delete the account and everything it owns
pub async fn delete_user(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    users::delete_user(&state.db, user.id).await?;
    tracing::info!(user_id = user.id, "user account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Change the account password after verifying the current one
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<User>> {
    let user = users::change_password(
        &state.db,
        user.id,
        request.current_password,
        request.new_password,
    )
    .await?;
    Ok(Json(user))
}
