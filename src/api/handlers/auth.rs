use axum::{extract::State, http::StatusCode, Form, Json};
use serde::Deserialize;

use crate::api::AppState;
use crate::auth;
use crate::error::{AppError, AppResult};
use crate::models::{Token, User};
use crate::services::users;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// Handlers

/// Create a new user account
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::register_user(
        &state.db,
        &request.username,
        request.email,
        request.name,
        request.password,
    )
    .await?;

    tracing::info!(username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange username/password form credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<Token>> {
    let user = users::authenticate(&state.db, &form.username, form.password).await?;
    let access_token = auth::issue_token(&state.config, user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(username = %user.username, "user authenticated");
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
