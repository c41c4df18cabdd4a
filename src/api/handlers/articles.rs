use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::AppResult;
use crate::models::{ArticleDetail, Category, Source, UserPreference};
use crate::services::{articles, preferences};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListArticlesParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    pub category_id: Option<i64>,
}

fn default_list_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    20
}

// Handlers

/// List articles, filtered by the viewer's blacklists when authenticated
pub async fn get_articles(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<ListArticlesParams>,
) -> AppResult<Json<Vec<ArticleDetail>>> {
    let articles = articles::list_articles(
        &state.db,
        viewer.user_id(),
        params.category_id,
        params.skip,
        params.limit,
    )
    .await?;

    tracing::debug!(count = articles.len(), viewer = ?viewer.user_id(), "returning articles");
    Ok(Json(articles))
}

/// Get a single article by id
pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
) -> AppResult<Json<ArticleDetail>> {
    let article = articles::get_article(&state.db, article_id).await?;
    Ok(Json(article))
}

/// Full-text article search, honoring the viewer's blacklists
pub async fn search_articles(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<ArticleDetail>>> {
    let results =
        articles::search_articles(&state.db, viewer.user_id(), &params.query, params.limit)
            .await?;
    Ok(Json(results))
}

/// Record a read event and bump the reader's category score
pub async fn track_article_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(article_id): Path<i64>,
) -> AppResult<Json<UserPreference>> {
    let preference = preferences::track_read(&state.db, user.id, article_id).await?;
    Ok(Json(preference))
}

/// List all content categories
pub async fn get_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = articles::list_categories(&state.db).await?;
    Ok(Json(categories))
}

/// List all news sources
pub async fn get_sources(State(state): State<AppState>) -> AppResult<Json<Vec<Source>>> {
    let sources = articles::list_sources(&state.db).await?;
    Ok(Json(sources))
}
