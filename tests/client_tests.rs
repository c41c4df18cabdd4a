use newsfeed_api::api::{create_router, AppState};
use newsfeed_api::client::{ApiClient, ClientError, FeedEvent, FeedState, FeedView, SortOrder};
use newsfeed_api::config::Config;
use newsfeed_api::db;

/// Boots the API on an OS-assigned port and returns its base URL
async fn spawn_server() -> String {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::init_schema(&pool).await.unwrap();
    db::seed::seed_all(&pool).await.unwrap();

    let app = create_router(AppState::new(pool, Config::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn logged_in_feed(base_url: &str, username: &str) -> FeedView {
    let mut client = ApiClient::new(base_url.to_string());
    client.register(username, None, "pw").await.unwrap();
    client.login(username, "pw").await.unwrap();

    let mut feed = FeedView::new(client);
    feed.load().await;
    assert_eq!(*feed.state(), FeedState::Ready);
    feed
}

#[tokio::test]
async fn test_anonymous_feed_loads_and_paginates() {
    let base_url = spawn_server().await;
    let mut feed = FeedView::new(ApiClient::new(base_url));

    feed.load().await;
    assert_eq!(*feed.state(), FeedState::Ready);

    // 16 fixture articles: a 9-article window, then the rest on one click
    assert_eq!(feed.visible_articles().len(), 9);
    assert!(feed.has_more());
    feed.load_more();
    assert_eq!(feed.visible_articles().len(), 16);
    assert!(!feed.has_more());
}

#[tokio::test]
async fn test_unreachable_backend_enters_error_state_with_retry() {
    // Nothing listens here
    let mut feed = FeedView::new(ApiClient::new("http://127.0.0.1:9"));

    feed.load().await;
    assert!(matches!(feed.state(), FeedState::Error(_)));

    feed.retry().await;
    assert!(matches!(feed.state(), FeedState::Error(_)));
}

#[tokio::test]
async fn test_sort_and_category_controls() {
    let base_url = spawn_server().await;
    let mut feed = FeedView::new(ApiClient::new(base_url));
    feed.load().await;

    feed.set_sort(SortOrder::Oldest);
    let visible = feed.visible_articles();
    for pair in visible.windows(2) {
        assert!(pair[0].published_at <= pair[1].published_at);
    }

    feed.set_category(Some("Sports".to_string()));
    let visible = feed.visible_articles();
    assert!(!visible.is_empty());
    assert!(visible.iter().all(|a| a.category.name == "Sports"));
}

#[tokio::test]
async fn test_optimistic_favorite_toggle_roundtrip() {
    let base_url = spawn_server().await;
    let mut feed = logged_in_feed(&base_url, "bookworm").await;
    let mut events = feed.subscribe();

    let article_id = feed.visible_articles()[0].id;
    assert!(!feed.is_favorite(article_id));

    let now_favorite = feed.toggle_favorite(article_id).await.unwrap();
    assert!(now_favorite);
    assert!(feed.is_favorite(article_id));
    assert_eq!(events.try_recv().unwrap(), FeedEvent::PreferencesChanged);

    let now_favorite = feed.toggle_favorite(article_id).await.unwrap();
    assert!(!now_favorite);
    assert!(!feed.is_favorite(article_id));
}

#[tokio::test]
async fn test_favorite_requires_login_before_any_request() {
    let base_url = spawn_server().await;
    let mut feed = FeedView::new(ApiClient::new(base_url));
    feed.load().await;

    let err = feed.toggle_favorite(1).await;
    assert!(matches!(err, Err(ClientError::NotLoggedIn)));
    assert!(!feed.is_favorite(1));
}

#[tokio::test]
async fn test_hide_article_reloads_without_it() {
    let base_url = spawn_server().await;
    let mut feed = logged_in_feed(&base_url, "curator").await;

    let hidden_id = feed.visible_articles()[0].id;
    feed.hide_article(hidden_id).await.unwrap();

    assert_eq!(*feed.state(), FeedState::Ready);
    feed.load_more();
    assert!(feed.visible_articles().iter().all(|a| a.id != hidden_id));
}

#[tokio::test]
async fn test_block_category_by_name() {
    let base_url = spawn_server().await;
    let mut feed = logged_in_feed(&base_url, "nosports").await;

    feed.block_category("Sports").await.unwrap();
    assert_eq!(*feed.state(), FeedState::Ready);

    feed.load_more();
    let visible = feed.visible_articles();
    assert!(!visible.is_empty());
    assert!(visible.iter().all(|a| a.category.name != "Sports"));

    // Unknown names fail without touching the backend
    let err = feed.block_category("Gardening").await;
    assert!(matches!(err, Err(ClientError::Validation(_))));
}

#[tokio::test]
async fn test_block_source_reloads_feed() {
    let base_url = spawn_server().await;
    let mut feed = logged_in_feed(&base_url, "picky").await;

    let blocked_source = feed.visible_articles()[0].source_id;
    feed.block_source(blocked_source).await.unwrap();

    assert_eq!(*feed.state(), FeedState::Ready);
    feed.load_more();
    assert!(feed
        .visible_articles()
        .iter()
        .all(|a| a.source_id != blocked_source));
}

#[tokio::test]
async fn test_read_tracking_feeds_top_categories() {
    let base_url = spawn_server().await;
    let mut feed = logged_in_feed(&base_url, "avid").await;
    let mut events = feed.subscribe();

    let (article_id, category_id) = {
        let first = feed.visible_articles()[0];
        (first.id, first.category_id)
    };
    let preference = feed.read_article(article_id).await.unwrap();
    assert_eq!(preference.score, 1);
    assert_eq!(events.try_recv().unwrap(), FeedEvent::PreferencesChanged);

    let preference = feed.read_article(article_id).await.unwrap();
    assert_eq!(preference.score, 2);

    // The interests widget sees the bumped category
    let top = feed.client_mut().top_categories(3).await.unwrap();
    assert_eq!(top[0].id, category_id);
    assert_eq!(top[0].score, 2);
}

#[tokio::test]
async fn test_search_mode_over_results_then_back() {
    let base_url = spawn_server().await;
    let mut feed = FeedView::new(ApiClient::new(base_url));
    feed.load().await;

    feed.search("marathon").await.unwrap();
    assert_eq!(*feed.state(), FeedState::Searching);
    let results = feed.visible_articles();
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .any(|a| a.title.to_lowercase().contains("marathon")));

    feed.clear_search();
    assert_eq!(*feed.state(), FeedState::Ready);
    assert_eq!(feed.visible_articles().len(), 9);
}
