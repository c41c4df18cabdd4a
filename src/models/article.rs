use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Source};

/// A news article as stored, with foreign keys only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub summary: Option<String>,
    pub category_id: i64,
    pub source_id: i64,
}

/// An article expanded with its category and source, the shape list and
/// detail endpoints return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub summary: Option<String>,
    pub category_id: i64,
    pub source_id: i64,
    pub category: Category,
    pub source: Source,
}

/// Flat row produced by the articles/categories/sources join, converted
/// into the nested [`ArticleDetail`] response shape
#[derive(Debug, sqlx::FromRow)]
pub struct ArticleDetailRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub summary: Option<String>,
    pub category_id: i64,
    pub source_id: i64,
    pub category_name: String,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
    pub category_article_count: i64,
    pub source_name: String,
    pub source_url: String,
    pub subscription_required: bool,
    pub logo_url: Option<String>,
}

impl From<ArticleDetailRow> for ArticleDetail {
    fn from(row: ArticleDetailRow) -> Self {
        ArticleDetail {
            id: row.id,
            title: row.title,
            url: row.url,
            published_at: row.published_at,
            image_url: row.image_url,
            summary: row.summary,
            category_id: row.category_id,
            source_id: row.source_id,
            category: Category {
                id: row.category_id,
                name: row.category_name,
                icon: row.category_icon,
                color: row.category_color,
                article_count: row.category_article_count,
            },
            source: Source {
                id: row.source_id,
                name: row.source_name,
                url: row.source_url,
                subscription_required: row.subscription_required,
                logo_url: row.logo_url,
            },
        }
    }
}
