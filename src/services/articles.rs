use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Article, ArticleDetail, ArticleDetailRow, Category, Source};

/// Shared select list for the articles/categories/sources join
pub(super) const DETAIL_COLUMNS: &str = "a.id, a.title, a.url, a.published_at, a.image_url, a.summary, \
     a.category_id, a.source_id, \
     c.name AS category_name, c.icon AS category_icon, c.color AS category_color, \
     c.article_count AS category_article_count, \
     s.name AS source_name, s.url AS source_url, s.subscription_required, s.logo_url";

/// Excludes everything the viewer has blocked: blacklisted categories,
/// blacklisted sources, and individually hidden articles. With a NULL
/// viewer every subquery is empty, so anonymous requests are unfiltered.
const VIEWER_FILTER: &str = "NOT EXISTS (SELECT 1 FROM user_preferences p \
         WHERE p.user_id = ?2 AND p.category_id = a.category_id AND p.blacklisted = 1) \
     AND NOT EXISTS (SELECT 1 FROM user_source_blacklist sb \
         WHERE sb.user_id = ?2 AND sb.source_id = a.source_id) \
     AND NOT EXISTS (SELECT 1 FROM user_article_blacklist ab \
         WHERE ab.user_id = ?2 AND ab.article_id = a.id)";

/// Lists the articles the viewer is allowed to see, newest first.
///
/// Blacklist exclusion happens in the WHERE clause, before LIMIT/OFFSET,
/// so page sizes stay correct.
pub async fn list_articles(
    pool: &SqlitePool,
    viewer: Option<i64>,
    category_id: Option<i64>,
    skip: i64,
    limit: i64,
) -> AppResult<Vec<ArticleDetail>> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS}
         FROM articles a
         JOIN categories c ON c.id = a.category_id
         JOIN sources s ON s.id = a.source_id
         WHERE (?1 IS NULL OR a.category_id = ?1)
           AND {VIEWER_FILTER}
         ORDER BY a.published_at DESC
         LIMIT ?3 OFFSET ?4"
    );

    let rows = sqlx::query_as::<_, ArticleDetailRow>(&sql)
        .bind(category_id)
        .bind(viewer)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ArticleDetail::from).collect())
}

/// Case-insensitive substring search across article title, summary,
/// source name, and category name. Queries shorter than two effective
/// characters are rejected before touching the database.
pub async fn search_articles(
    pool: &SqlitePool,
    viewer: Option<i64>,
    query: &str,
    limit: i64,
) -> AppResult<Vec<ArticleDetail>> {
    let trimmed = query.trim();
    if trimmed.chars().count() < 2 {
        return Err(AppError::InvalidInput(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    let pattern = format!("%{}%", trimmed.to_lowercase());
    let sql = format!(
        "SELECT {DETAIL_COLUMNS}
         FROM articles a
         JOIN categories c ON c.id = a.category_id
         JOIN sources s ON s.id = a.source_id
         WHERE (LOWER(a.title) LIKE ?1
             OR LOWER(COALESCE(a.summary, '')) LIKE ?1
             OR LOWER(s.name) LIKE ?1
             OR LOWER(c.name) LIKE ?1)
           AND {VIEWER_FILTER}
         ORDER BY a.published_at DESC
         LIMIT ?3"
    );

    let rows = sqlx::query_as::<_, ArticleDetailRow>(&sql)
        .bind(pattern)
        .bind(viewer)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ArticleDetail::from).collect())
}

pub async fn get_article(pool: &SqlitePool, article_id: i64) -> AppResult<ArticleDetail> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS}
         FROM articles a
         JOIN categories c ON c.id = a.category_id
         JOIN sources s ON s.id = a.source_id
         WHERE a.id = ?1"
    );

    let row = sqlx::query_as::<_, ArticleDetailRow>(&sql)
        .bind(article_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    Ok(ArticleDetail::from(row))
}

/// Flat article lookup used by the mutation endpoints, which echo the
/// article back without the joined detail.
pub async fn get_flat_article(pool: &SqlitePool, article_id: i64) -> AppResult<Option<Article>> {
    let article = sqlx::query_as::<_, Article>(
        "SELECT id, title, url, published_at, image_url, summary, category_id, source_id
         FROM articles WHERE id = ?1",
    )
    .bind(article_id)
    .fetch_optional(pool)
    .await?;
    Ok(article)
}

pub async fn list_categories(pool: &SqlitePool) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, icon, color, article_count FROM categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn list_sources(pool: &SqlitePool) -> AppResult<Vec<Source>> {
    let sources = sqlx::query_as::<_, Source>(
        "SELECT id, name, url, subscription_required, logo_url FROM sources ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(sources)
}
