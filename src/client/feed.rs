use std::collections::HashSet;

use tokio::sync::broadcast;

use crate::models::{ArticleDetail, Category, UserPreference};

use super::api::{ApiClient, ClientError, ClientResult};

/// Articles shown before the first "load more"
pub const INITIAL_VISIBLE_COUNT: usize = 9;
/// Articles revealed by each "load more"
pub const LOAD_MORE_STEP: usize = 9;

/// How many articles one feed load pulls into memory
const FETCH_LIMIT: i64 = 100;
const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    Oldest,
}

/// Feed page states. `Searching` is a parallel mode: the category and sort
/// controls keep working, but over the search results instead of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Loading,
    Ready,
    Searching,
    Error(String),
}

/// Cross-component notification broadcast after read-tracking and favorite
/// changes, so detached widgets can refresh without being wired to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    PreferencesChanged,
}

/// The feed a user is looking at: the fetched article set plus every piece
/// of presentation state derived from it. Mutations reconcile either
/// locally (favorites) or by re-fetching the whole page (blocking/hiding),
/// since blocking can change visibility across categories.
pub struct FeedView {
    client: ApiClient,
    state: FeedState,
    articles: Vec<ArticleDetail>,
    search_results: Vec<ArticleDetail>,
    categories: Vec<Category>,
    favorites: HashSet<i64>,
    blacklisted_categories: HashSet<i64>,
    active_category: Option<String>,
    sort: SortOrder,
    visible_count: usize,
    events: broadcast::Sender<FeedEvent>,
}

impl FeedView {
    pub fn new(client: ApiClient) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            state: FeedState::Loading,
            articles: Vec::new(),
            search_results: Vec::new(),
            categories: Vec::new(),
            favorites: HashSet::new(),
            blacklisted_categories: HashSet::new(),
            active_category: None,
            sort: SortOrder::Newest,
            visible_count: INITIAL_VISIBLE_COUNT,
            events,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_favorite(&self, article_id: i64) -> bool {
        self.favorites.contains(&article_id)
    }

    pub fn client_mut(&mut self) -> &mut ApiClient {
        &mut self.client
    }

    /// Observers subscribe here for `PreferencesChanged` notifications
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Fetches everything the page needs. One failed fetch puts the whole
    /// page into the error state, even if the others succeeded.
    pub async fn load(&mut self) {
        self.state = FeedState::Loading;
        match self.fetch_all().await {
            Ok(()) => self.state = FeedState::Ready,
            Err(err) => {
                tracing::warn!(error = %err, "feed load failed");
                self.state = FeedState::Error(err.to_string());
            }
        }
    }

    /// Retry affordance exposed by the error state
    pub async fn retry(&mut self) {
        self.load().await;
    }

    async fn fetch_all(&mut self) -> ClientResult<()> {
        if self.client.is_authenticated() {
            let me = self.client.me().await?;
            let (articles, categories, favorites, preferences) = tokio::try_join!(
                self.client.articles(None, 0, FETCH_LIMIT),
                self.client.categories(),
                self.client.favorite_articles(),
                self.client.preferences(me.id),
            )?;
            self.articles = articles;
            self.categories = categories;
            self.favorites = favorites.iter().map(|a| a.id).collect();
            self.blacklisted_categories = blacklisted_category_ids(&preferences);
        } else {
            let (articles, categories) = tokio::try_join!(
                self.client.articles(None, 0, FETCH_LIMIT),
                self.client.categories(),
            )?;
            self.articles = articles;
            self.categories = categories;
            self.favorites.clear();
            self.blacklisted_categories.clear();
        }

        self.search_results.clear();
        self.visible_count = INITIAL_VISIBLE_COUNT;
        Ok(())
    }

    // ----- derived view -----

    fn filtered(&self) -> Vec<&ArticleDetail> {
        let source = match self.state {
            FeedState::Searching => &self.search_results,
            _ => &self.articles,
        };

        source
            .iter()
            .filter(|a| {
                self.active_category
                    .as_deref()
                    .map_or(true, |name| a.category.name == name)
            })
            // Defensive re-filter: the backend already excludes blacklisted
            // categories, but locally cached articles may predate a block.
            .filter(|a| !self.blacklisted_categories.contains(&a.category_id))
            .collect()
    }

    /// The articles currently on screen: category filter, then sort, then
    /// the visible-count window.
    pub fn visible_articles(&self) -> Vec<&ArticleDetail> {
        let mut visible = self.filtered();
        match self.sort {
            SortOrder::Newest => visible.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
            SortOrder::Oldest => visible.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
        }
        visible.truncate(self.visible_count);
        visible
    }

    /// Whether a "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.filtered().len() > self.visible_count
    }

    /// Reveals the next window of articles instead of re-fetching
    pub fn load_more(&mut self) {
        if self.has_more() {
            self.visible_count += LOAD_MORE_STEP;
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.active_category = category;
        self.visible_count = INITIAL_VISIBLE_COUNT;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    // ----- search mode -----

    /// Runs a search and switches the view over the results. Too-short
    /// queries are rejected here, before any request is made.
    pub async fn search(&mut self, query: &str) -> ClientResult<()> {
        let trimmed = query.trim();
        if trimmed.chars().count() < 2 {
            return Err(ClientError::Validation(
                "Search query must be at least 2 characters".to_string(),
            ));
        }

        self.search_results = self.client.search(trimmed, SEARCH_LIMIT).await?;
        self.state = FeedState::Searching;
        self.visible_count = INITIAL_VISIBLE_COUNT;
        Ok(())
    }

    /// Leaves search mode and returns to the original feed
    pub fn clear_search(&mut self) {
        self.search_results.clear();
        if self.state == FeedState::Searching {
            self.state = FeedState::Ready;
        }
        self.visible_count = INITIAL_VISIBLE_COUNT;
    }

    // ----- reconciliation on user actions -----

    /// Records a read event and notifies observers that preference state
    /// moved underneath them.
    pub async fn read_article(&mut self, article_id: i64) -> ClientResult<UserPreference> {
        let preference = self.client.track_read(article_id).await?;
        let _ = self.events.send(FeedEvent::PreferencesChanged);
        Ok(preference)
    }

    /// Optimistic favorite toggle: the bookmark state flips immediately and
    /// is rolled back if the mutation fails. Returns whether the article is
    /// now a favorite.
    pub async fn toggle_favorite(&mut self, article_id: i64) -> ClientResult<bool> {
        if !self.client.is_authenticated() {
            return Err(ClientError::NotLoggedIn);
        }

        let adding = !self.favorites.contains(&article_id);
        if adding {
            self.favorites.insert(article_id);
        } else {
            self.favorites.remove(&article_id);
        }

        let result = if adding {
            self.client.add_favorite(article_id).await.map(|_| ())
        } else {
            self.client.remove_favorite(article_id).await
        };

        if let Err(err) = result {
            // Roll the optimistic patch back
            if adding {
                self.favorites.remove(&article_id);
            } else {
                self.favorites.insert(article_id);
            }
            return Err(err);
        }

        let _ = self.events.send(FeedEvent::PreferencesChanged);
        Ok(adding)
    }

    /// Hides one article, then re-fetches the page
    pub async fn hide_article(&mut self, article_id: i64) -> ClientResult<()> {
        self.client.hide_article(article_id).await?;
        self.load().await;
        Ok(())
    }

    /// Blocks a source, then re-fetches the page
    pub async fn block_source(&mut self, source_id: i64) -> ClientResult<()> {
        self.client.block_source(source_id).await?;
        self.load().await;
        Ok(())
    }

    /// Blocks a category by id, then re-fetches the page
    pub async fn block_category_id(&mut self, category_id: i64) -> ClientResult<()> {
        self.client
            .update_preference(category_id, None, Some(true))
            .await?;
        self.load().await;
        Ok(())
    }

    /// Convenience: blocks a category by display name, resolved against the
    /// loaded category list.
    pub async fn block_category(&mut self, name: &str) -> ClientResult<()> {
        let category_id = self
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id)
            .ok_or_else(|| ClientError::Validation(format!("Category not found: {}", name)))?;
        self.block_category_id(category_id).await
    }
}

fn blacklisted_category_ids(preferences: &[UserPreference]) -> HashSet<i64> {
    preferences
        .iter()
        .filter(|p| p.blacklisted)
        .map(|p| p.category_id)
        .collect()
}
