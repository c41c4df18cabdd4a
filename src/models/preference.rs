use serde::{Deserialize, Serialize};

use super::Category;

/// A user's interest record for one category: an integer score bumped by
/// read-tracking plus an explicit blacklist flag. At most one row exists
/// per (user, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub score: i64,
    pub blacklisted: bool,
    #[sqlx(skip)]
    pub category: Option<Category>,
}

/// Flat row from the preferences/categories join
#[derive(Debug, sqlx::FromRow)]
pub struct PreferenceWithCategoryRow {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub score: i64,
    pub blacklisted: bool,
    pub category_name: String,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
    pub category_article_count: i64,
}

impl From<PreferenceWithCategoryRow> for UserPreference {
    fn from(row: PreferenceWithCategoryRow) -> Self {
        UserPreference {
            id: row.id,
            user_id: row.user_id,
            category_id: row.category_id,
            score: row.score,
            blacklisted: row.blacklisted,
            category: Some(Category {
                id: row.category_id,
                name: row.category_name,
                icon: row.category_icon,
                color: row.category_color,
                article_count: row.category_article_count,
            }),
        }
    }
}

/// One entry of the "your interests" shortcut: a non-blacklisted category
/// with a positive score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopCategory {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub score: i64,
}
