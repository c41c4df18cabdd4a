use newsfeed_api::api::{create_router, AppState};
use newsfeed_api::config::Config;
use newsfeed_api::db;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsfeed_api=debug,tower_http=info".into()),
        )
        .init();

    // Initialize the database and demo content
    let pool = db::create_pool(&config.database_url).await?;
    db::init_schema(&pool).await?;
    db::seed::seed_all(&pool).await?;

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
