use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Article, ArticleDetail, Source, TopCategory, UserPreference};
use crate::services::preferences;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct UpdatePreferenceRequest {
    pub score: Option<i64>,
    pub blacklisted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TopCategoriesParams {
    #[serde(default = "default_top_limit")]
    pub limit: i64,
}

fn default_top_limit() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct SourceRef {
    pub source_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ArticleRef {
    pub article_id: i64,
}

// Handlers

/// List a user's category preferences; users may only read their own
pub async fn get_user_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<UserPreference>>> {
    if user.id != user_id {
        return Err(AppError::Forbidden(
            "Not authorized to access these preferences".to_string(),
        ));
    }
    let preferences = preferences::get_preferences(&state.db, user_id).await?;
    Ok(Json(preferences))
}

/// Update the score and/or blacklist flag for one category
pub async fn update_user_preference(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i64>,
    Json(request): Json<UpdatePreferenceRequest>,
) -> AppResult<Json<UserPreference>> {
    let preference = preferences::update_preference(
        &state.db,
        user.id,
        category_id,
        request.score,
        request.blacklisted,
    )
    .await?;
    Ok(Json(preference))
}

/// The "your interests" shortcut: highest-scoring visible categories
pub async fn get_top_categories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<TopCategoriesParams>,
) -> AppResult<Json<Vec<TopCategory>>> {
    let top = preferences::top_categories(&state.db, user.id, params.limit).await?;
    Ok(Json(top))
}

// Source blacklist

pub async fn get_blacklisted_sources(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Source>>> {
    let sources = preferences::list_blacklisted_sources(&state.db, user.id).await?;
    Ok(Json(sources))
}

pub async fn add_blacklisted_source(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SourceRef>,
) -> AppResult<(StatusCode, Json<Source>)> {
    let source =
        preferences::add_blacklisted_source(&state.db, user.id, request.source_id).await?;
    Ok((StatusCode::CREATED, Json(source)))
}

pub async fn remove_blacklisted_source(
    State(state): State<AppState>,
    user: AuthUser,
    Path(source_id): Path<i64>,
) -> AppResult<StatusCode> {
    preferences::remove_blacklisted_source(&state.db, user.id, source_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Article blacklist

pub async fn get_blacklisted_articles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<ArticleDetail>>> {
    let articles = preferences::list_blacklisted_articles(&state.db, user.id).await?;
    Ok(Json(articles))
}

pub async fn add_blacklisted_article(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ArticleRef>,
) -> AppResult<(StatusCode, Json<Article>)> {
    let article =
        preferences::add_blacklisted_article(&state.db, user.id, request.article_id).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn remove_blacklisted_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(article_id): Path<i64>,
) -> AppResult<StatusCode> {
    preferences::remove_blacklisted_article(&state.db, user.id, article_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Favorites

pub async fn get_favorite_articles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<ArticleDetail>>> {
    let articles = preferences::list_favorite_articles(&state.db, user.id).await?;
    Ok(Json(articles))
}

pub async fn add_favorite_article(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ArticleRef>,
) -> AppResult<(StatusCode, Json<Article>)> {
    let article =
        preferences::add_favorite_article(&state.db, user.id, request.article_id).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn remove_favorite_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(article_id): Path<i64>,
) -> AppResult<StatusCode> {
    preferences::remove_favorite_article(&state.db, user.id, article_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
