mod article;
mod preference;
mod user;

pub use article::{Article, ArticleDetail, ArticleDetailRow};
pub use preference::{PreferenceWithCategoryRow, TopCategory, UserPreference};
pub use user::{Token, User};

use serde::{Deserialize, Serialize};

/// A content category articles are classified under.
///
/// `article_count` is denormalized and maintained when articles are
/// inserted, so category listings avoid a COUNT per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub article_count: i64,
}

/// A news publisher articles are attributed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub subscription_required: bool,
    pub logo_url: Option<String>,
}
