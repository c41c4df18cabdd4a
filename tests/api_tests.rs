use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use newsfeed_api::api::{create_router, AppState};
use newsfeed_api::config::Config;
use newsfeed_api::db;

async fn create_test_server() -> TestServer {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::init_schema(&pool).await.unwrap();
    db::seed::seed_all(&pool).await.unwrap();

    let state = AppState::new(pool, Config::default());
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn register_and_login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/register")
        .json(&json!({
            "username": username,
            "password": "pw",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/token")
        .form(&[("username", username), ("password", "pw")])
        .await;
    response.assert_status_ok();
    let token: Value = response.json();
    assert_eq!(token["token_type"], "bearer");
    token["access_token"].as_str().unwrap().to_string()
}

async fn category_id_by_name(server: &TestServer, name: &str) -> i64 {
    let categories: Vec<Value> = server.get("/categories").await.json();
    categories
        .iter()
        .find(|c| c["name"] == name)
        .and_then(|c| c["id"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_register_login_and_me() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let response = server.get("/users/me").authorization_bearer(&token).await;
    response.assert_status_ok();
    let me: Value = response.json();
    assert_eq!(me["username"], "reader");
    assert!(me.get("password_hash").is_none());

    // Duplicate registration is rejected with the backend's message
    let response = server
        .post("/register")
        .json(&json!({"username": "reader", "password": "other"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Username already registered");

    // Wrong password is a 401
    let response = server
        .post("/token")
        .form(&[("username", "reader"), ("password", "nope")])
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutations_require_authentication() {
    let server = create_test_server().await;

    let response = server.post("/articles/1/read").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/users/me/favorite-articles")
        .json(&json!({"article_id": 1}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_track_read_accumulates_score() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let response = server
        .post("/articles/1/read")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let pref: Value = response.json();
    assert_eq!(pref["score"], 1);

    let response = server
        .post("/articles/1/read")
        .authorization_bearer(&token)
        .await;
    let pref: Value = response.json();
    assert_eq!(pref["score"], 2);

    // Reading a missing article is a 404
    let response = server
        .post("/articles/999999/read")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_blacklist_roundtrip() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;
    let sports = category_id_by_name(&server, "Sports").await;

    let me: Value = server.get("/users/me").authorization_bearer(&token).await.json();
    let user_id = me["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/users/me/preferences/{}", sports))
        .authorization_bearer(&token)
        .json(&json!({"blacklisted": true}))
        .await;
    response.assert_status_ok();

    let prefs: Vec<Value> = server
        .get(&format!("/users/{}/preferences", user_id))
        .authorization_bearer(&token)
        .await
        .json();
    let sports_pref = prefs.iter().find(|p| p["category_id"] == sports).unwrap();
    assert_eq!(sports_pref["blacklisted"], true);
    assert_eq!(sports_pref["category"]["name"], "Sports");

    // Toggling back restores it
    server
        .put(&format!("/users/me/preferences/{}", sports))
        .authorization_bearer(&token)
        .json(&json!({"blacklisted": false}))
        .await
        .assert_status_ok();
    let prefs: Vec<Value> = server
        .get(&format!("/users/{}/preferences", user_id))
        .authorization_bearer(&token)
        .await
        .json();
    let sports_pref = prefs.iter().find(|p| p["category_id"] == sports).unwrap();
    assert_eq!(sports_pref["blacklisted"], false);
}

#[tokio::test]
async fn test_preferences_are_private() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let response = server
        .get("/users/999/preferences")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blacklisted_category_disappears_from_feed() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;
    let sports = category_id_by_name(&server, "Sports").await;

    // Fixture data has Sports and non-Sports articles
    let articles: Vec<Value> = server.get("/articles").await.json();
    assert!(articles.iter().any(|a| a["category"]["name"] == "Sports"));

    server
        .put(&format!("/users/me/preferences/{}", sports))
        .authorization_bearer(&token)
        .json(&json!({"blacklisted": true}))
        .await
        .assert_status_ok();

    let articles: Vec<Value> = server
        .get("/articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(!articles.is_empty());
    assert!(articles.iter().all(|a| a["category"]["name"] != "Sports"));

    // Anonymous viewers still see Sports
    let articles: Vec<Value> = server.get("/articles").await.json();
    assert!(articles.iter().any(|a| a["category"]["name"] == "Sports"));
}

#[tokio::test]
async fn test_blacklists_hold_under_filters_and_search() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let articles: Vec<Value> = server.get("/articles").await.json();
    let victim = &articles[0];
    let victim_id = victim["id"].as_i64().unwrap();
    let victim_category = victim["category_id"].as_i64().unwrap();
    let victim_title = victim["title"].as_str().unwrap().to_string();

    server
        .post("/users/me/blacklisted-articles")
        .authorization_bearer(&token)
        .json(&json!({"article_id": victim_id}))
        .await
        .assert_status(StatusCode::CREATED);

    // Hidden even when its own category is requested explicitly
    let filtered: Vec<Value> = server
        .get("/articles")
        .add_query_param("category_id", victim_category)
        .authorization_bearer(&token)
        .await
        .json();
    assert!(filtered.iter().all(|a| a["id"].as_i64() != Some(victim_id)));

    // Hidden from search results too
    let results: Vec<Value> = server
        .get("/search")
        .add_query_param("query", &victim_title[..8])
        .authorization_bearer(&token)
        .await
        .json();
    assert!(results.iter().all(|a| a["id"].as_i64() != Some(victim_id)));
}

#[tokio::test]
async fn test_search_query_too_short() {
    let server = create_test_server().await;
    let response = server.get("/search").add_query_param("query", "a").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Search query must be at least 2 characters");
}

#[tokio::test]
async fn test_search_matches_across_fields() {
    let server = create_test_server().await;

    // Source name match
    let results: Vec<Value> = server
        .get("/search")
        .add_query_param("query", "bloomberg")
        .await
        .json();
    assert!(!results.is_empty());

    // Category name match
    let results: Vec<Value> = server
        .get("/search")
        .add_query_param("query", "environment")
        .await
        .json();
    assert!(!results.is_empty());
}

#[tokio::test]
async fn test_double_source_block_is_a_conflict() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let response = server
        .post("/users/me/blacklisted-sources")
        .authorization_bearer(&token)
        .json(&json!({"source_id": 1}))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/users/me/blacklisted-sources")
        .authorization_bearer(&token)
        .json(&json!({"source_id": 1}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "Source already blacklisted");

    // Exactly one row survives
    let blocked: Vec<Value> = server
        .get("/users/me/blacklisted-sources")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(blocked.iter().filter(|s| s["id"] == 1).count(), 1);
}

#[tokio::test]
async fn test_unblocking_unblocked_source_is_not_found() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let response = server
        .delete("/users/me/blacklisted-sources/1")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Source not found in blacklist");
}

#[tokio::test]
async fn test_favorite_roundtrip_restores_list() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    let before: Vec<Value> = server
        .get("/users/me/favorite-articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(before.is_empty());

    server
        .post("/users/me/favorite-articles")
        .authorization_bearer(&token)
        .json(&json!({"article_id": 3}))
        .await
        .assert_status(StatusCode::CREATED);

    // Favoriting twice is a conflict
    let response = server
        .post("/users/me/favorite-articles")
        .authorization_bearer(&token)
        .json(&json!({"article_id": 3}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    server
        .delete("/users/me/favorite-articles/3")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let after: Vec<Value> = server
        .get("/users/me/favorite-articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_hidden_articles_can_be_listed_and_unhidden() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    server
        .post("/users/me/blacklisted-articles")
        .authorization_bearer(&token)
        .json(&json!({"article_id": 2}))
        .await
        .assert_status(StatusCode::CREATED);

    let hidden: Vec<Value> = server
        .get("/users/me/blacklisted-articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0]["id"], 2);
    // The hidden listing carries full category/source detail
    assert!(hidden[0]["category"]["name"].is_string());

    server
        .delete("/users/me/blacklisted-articles/2")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let articles: Vec<Value> = server
        .get("/articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(articles.iter().any(|a| a["id"] == 2));
}

#[tokio::test]
async fn test_top_categories_reflect_reads() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "reader").await;

    // Two reads in one category, one in another
    let articles: Vec<Value> = server.get("/articles").await.json();
    let first = articles
        .iter()
        .find(|a| a["category"]["name"] == "Technology")
        .unwrap();
    let second = articles
        .iter()
        .find(|a| a["category"]["name"] == "Health")
        .unwrap();

    for _ in 0..2 {
        server
            .post(&format!("/articles/{}/read", first["id"]))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
    }
    server
        .post(&format!("/articles/{}/read", second["id"]))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let top: Vec<Value> = server
        .get("/users/me/top-categories")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(top[0]["name"], "Technology");
    assert_eq!(top[0]["score"], 2);
    assert_eq!(top[1]["name"], "Health");
}

#[tokio::test]
async fn test_article_detail_and_missing_article() {
    let server = create_test_server().await;

    let response = server.get("/articles/1").await;
    response.assert_status_ok();
    let article: Value = response.json();
    assert!(article["category"]["name"].is_string());
    assert!(article["source"]["name"].is_string());

    let response = server.get("/articles/999999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Article not found");
}

#[tokio::test]
async fn test_malformed_category_id_is_a_validation_error() {
    let server = create_test_server().await;
    let response = server
        .get("/articles")
        .add_query_param("category_id", "not-a-number")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_account_deletion_cascades() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "shortlived").await;

    server
        .post("/users/me/blacklisted-sources")
        .authorization_bearer(&token)
        .json(&json!({"source_id": 2}))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete("/users/me")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // The token still decodes but the account is gone
    let response = server.get("/users/me").authorization_bearer(&token).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
