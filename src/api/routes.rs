use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/register", post(handlers::auth::register_user))
        .route("/token", post(handlers::auth::login))
        // Current user
        .route(
            "/users/me",
            get(handlers::users::get_current_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/me/change-password", post(handlers::users::change_password))
        // Reference data
        .route("/categories", get(handlers::articles::get_categories))
        .route("/sources", get(handlers::articles::get_sources))
        // Articles
        .route("/articles", get(handlers::articles::get_articles))
        .route("/articles/:article_id", get(handlers::articles::get_article))
        .route(
            "/articles/:article_id/read",
            post(handlers::articles::track_article_read),
        )
        .route("/search", get(handlers::articles::search_articles))
        // Preferences
        .route(
            "/users/:user_id/preferences",
            get(handlers::preferences::get_user_preferences),
        )
        .route(
            "/users/me/preferences/:category_id",
            put(handlers::preferences::update_user_preference),
        )
        .route(
            "/users/me/top-categories",
            get(handlers::preferences::get_top_categories),
        )
        // Blacklists
        .route(
            "/users/me/blacklisted-sources",
            get(handlers::preferences::get_blacklisted_sources)
                .post(handlers::preferences::add_blacklisted_source),
        )
        .route(
            "/users/me/blacklisted-sources/:source_id",
            delete(handlers::preferences::remove_blacklisted_source),
        )
        .route(
            "/users/me/blacklisted-articles",
            get(handlers::preferences::get_blacklisted_articles)
                .post(handlers::preferences::add_blacklisted_article),
        )
        .route(
            "/users/me/blacklisted-articles/:article_id",
            delete(handlers::preferences::remove_blacklisted_article),
        )
        // Favorites
        .route(
            "/users/me/favorite-articles",
            get(handlers::preferences::get_favorite_articles)
                .post(handlers::preferences::add_favorite_article),
        )
        .route(
            "/users/me/favorite-articles/:article_id",
            delete(handlers::preferences::remove_favorite_article),
        )
        // Request IDs are assigned outside the trace layer so the span can
        // pick them up from the request extensions.
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
