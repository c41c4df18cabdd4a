use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{
    Article, ArticleDetail, ArticleDetailRow, PreferenceWithCategoryRow, Source, TopCategory,
    UserPreference,
};

use super::articles::DETAIL_COLUMNS;

const PREFERENCE_JOIN_COLUMNS: &str = "p.id, p.user_id, p.category_id, p.score, p.blacklisted, \
     c.name AS category_name, c.icon AS category_icon, c.color AS category_color, \
     c.article_count AS category_article_count";

/// Records a read event: the (user, category) preference row is created on
/// demand and its score bumped by one. The score only ever grows through
/// this path.
pub async fn track_read(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> AppResult<UserPreference> {
    let category_id = sqlx::query_scalar::<_, i64>("SELECT category_id FROM articles WHERE id = ?1")
        .bind(article_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    let preference = sqlx::query_as::<_, UserPreference>(
        "INSERT INTO user_preferences (user_id, category_id, score, blacklisted)
         VALUES (?1, ?2, 1, 0)
         ON CONFLICT(user_id, category_id) DO UPDATE SET score = score + 1
         RETURNING id, user_id, category_id, score, blacklisted",
    )
    .bind(user_id)
    .bind(category_id)
    .fetch_one(pool)
    .await?;

    Ok(preference)
}

/// All preference rows for a user, each joined with its category
pub async fn get_preferences(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<UserPreference>> {
    let sql = format!(
        "SELECT {PREFERENCE_JOIN_COLUMNS}
         FROM user_preferences p
         JOIN categories c ON c.id = p.category_id
         WHERE p.user_id = ?1
         ORDER BY p.category_id"
    );

    let rows = sqlx::query_as::<_, PreferenceWithCategoryRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(UserPreference::from).collect())
}

/// Partial update of a category preference. The row is created with
/// defaults if the user has never interacted with the category.
pub async fn update_preference(
    pool: &SqlitePool,
    user_id: i64,
    category_id: i64,
    score: Option<i64>,
    blacklisted: Option<bool>,
) -> AppResult<UserPreference> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = ?1")
        .bind(category_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    sqlx::query(
        "INSERT INTO user_preferences (user_id, category_id, score, blacklisted)
         VALUES (?1, ?2, 0, 0)
         ON CONFLICT(user_id, category_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(category_id)
    .execute(pool)
    .await?;

    sqlx::query(
        "UPDATE user_preferences
         SET score = COALESCE(?3, score), blacklisted = COALESCE(?4, blacklisted)
         WHERE user_id = ?1 AND category_id = ?2",
    )
    .bind(user_id)
    .bind(category_id)
    .bind(score)
    .bind(blacklisted)
    .execute(pool)
    .await?;

    let sql = format!(
        "SELECT {PREFERENCE_JOIN_COLUMNS}
         FROM user_preferences p
         JOIN categories c ON c.id = p.category_id
         WHERE p.user_id = ?1 AND p.category_id = ?2"
    );
    let row = sqlx::query_as::<_, PreferenceWithCategoryRow>(&sql)
        .bind(user_id)
        .bind(category_id)
        .fetch_one(pool)
        .await?;

    Ok(UserPreference::from(row))
}

/// The user's highest-scoring, non-blacklisted categories with a positive
/// score; ties resolve by category id ascending.
pub async fn top_categories(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> AppResult<Vec<TopCategory>> {
    let rows = sqlx::query_as::<_, TopCategory>(
        "SELECT c.id, c.name, c.icon, c.color, p.score
         FROM user_preferences p
         JOIN categories c ON c.id = p.category_id
         WHERE p.user_id = ?1 AND p.blacklisted = 0 AND p.score > 0
         ORDER BY p.score DESC, c.id ASC
         LIMIT ?2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ----- source blacklist -----

pub async fn list_blacklisted_sources(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Source>> {
    let sources = sqlx::query_as::<_, Source>(
        "SELECT s.id, s.name, s.url, s.subscription_required, s.logo_url
         FROM user_source_blacklist b
         JOIN sources s ON s.id = b.source_id
         WHERE b.user_id = ?1
         ORDER BY s.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(sources)
}

/// Blocks a source. A second block of the same source is rejected by the
/// (user, source) unique constraint and surfaced as a conflict.
pub async fn add_blacklisted_source(
    pool: &SqlitePool,
    user_id: i64,
    source_id: i64,
) -> AppResult<Source> {
    let source = sqlx::query_as::<_, Source>(
        "SELECT id, name, url, subscription_required, logo_url FROM sources WHERE id = ?1",
    )
    .bind(source_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Source not found".to_string()))?;

    sqlx::query("INSERT INTO user_source_blacklist (user_id, source_id) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(source_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Source already blacklisted"))?;

    Ok(source)
}

pub async fn remove_blacklisted_source(
    pool: &SqlitePool,
    user_id: i64,
    source_id: i64,
) -> AppResult<()> {
    let result =
        sqlx::query("DELETE FROM user_source_blacklist WHERE user_id = ?1 AND source_id = ?2")
            .bind(user_id)
            .bind(source_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Source not found in blacklist".to_string()));
    }
    Ok(())
}

// ----- article blacklist -----

pub async fn list_blacklisted_articles(
    pool: &SqlitePool,
    user_id: i64,
) -> AppResult<Vec<ArticleDetail>> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS}
         FROM user_article_blacklist b
         JOIN articles a ON a.id = b.article_id
         JOIN categories c ON c.id = a.category_id
         JOIN sources s ON s.id = a.source_id
         WHERE b.user_id = ?1
         ORDER BY a.published_at DESC"
    );
    let rows = sqlx::query_as::<_, ArticleDetailRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(ArticleDetail::from).collect())
}

pub async fn add_blacklisted_article(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> AppResult<Article> {
    let article = crate::services::articles::get_flat_article(pool, article_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    sqlx::query("INSERT INTO user_article_blacklist (user_id, article_id) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(article_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Article already blacklisted"))?;

    tracing::info!(user_id, article_id, "article blacklisted");
    Ok(article)
}

pub async fn remove_blacklisted_article(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> AppResult<()> {
    let result =
        sqlx::query("DELETE FROM user_article_blacklist WHERE user_id = ?1 AND article_id = ?2")
            .bind(user_id)
            .bind(article_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Article not found in blacklist".to_string()));
    }
    Ok(())
}

// ----- favorites -----

pub async fn list_favorite_articles(
    pool: &SqlitePool,
    user_id: i64,
) -> AppResult<Vec<ArticleDetail>> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS}
         FROM user_favorite_articles f
         JOIN articles a ON a.id = f.article_id
         JOIN categories c ON c.id = a.category_id
         JOIN sources s ON s.id = a.source_id
         WHERE f.user_id = ?1
         ORDER BY f.favorited_at DESC"
    );
    let rows = sqlx::query_as::<_, ArticleDetailRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(ArticleDetail::from).collect())
}

pub async fn add_favorite_article(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> AppResult<Article> {
    let article = crate::services::articles::get_flat_article(pool, article_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    sqlx::query(
        "INSERT INTO user_favorite_articles (user_id, article_id, favorited_at)
         VALUES (?1, ?2, ?3)",
    )
    .bind(user_id)
    .bind(article_id)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Article already in favorites"))?;

    Ok(article)
}

pub async fn remove_favorite_article(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> AppResult<()> {
    let result =
        sqlx::query("DELETE FROM user_favorite_articles WHERE user_id = ?1 AND article_id = ?2")
            .bind(user_id)
            .bind(article_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Article not found in favorites".to_string()));
    }
    Ok(())
}
