use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::auth;

/// Seeds users, categories, sources, and articles. Each seeder skips when
/// its table already holds rows, so startup is idempotent and never
/// clobbers user data.
pub async fn seed_all(pool: &SqlitePool) -> anyhow::Result<()> {
    seed_users(pool).await?;
    seed_categories(pool).await?;
    seed_sources(pool).await?;
    seed_articles(pool).await?;
    Ok(())
}

async fn count(pool: &SqlitePool, table: &str) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Demo account for development environments
async fn seed_users(pool: &SqlitePool) -> anyhow::Result<()> {
    if count(pool, "users").await? > 0 {
        tracing::info!("users already exist, skipping user seeding");
        return Ok(());
    }

    let now = Utc::now();
    let password_hash = auth::hash_password("pass".to_string()).await?;
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind("ajbarea")
    .bind("ajb6289@rit.edu")
    .bind(password_hash)
    .bind("AJ Barea")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!("created 1 initial user account");
    Ok(())
}

/// Standard content categories with visual styling information
async fn seed_categories(pool: &SqlitePool) -> anyhow::Result<()> {
    if count(pool, "categories").await? > 0 {
        tracing::info!("categories already exist, skipping category seeding");
        return Ok(());
    }

    let categories = [
        ("Business", "💼", "primary"),
        ("Technology", "💻", "purple"),
        ("Health", "🏥", "success"),
        ("Sports", "🏈", "danger"),
        ("Entertainment", "🎭", "warning"),
        ("Science", "🔬", "info"),
        ("Politics", "🏛️", "secondary"),
        ("Environment", "🌍", "success"),
    ];

    for (name, icon, color) in categories {
        sqlx::query("INSERT INTO categories (name, icon, color) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(icon)
            .bind(color)
            .execute(pool)
            .await?;
    }

    tracing::info!("created {} content categories", categories.len());
    Ok(())
}

/// News publishers with subscription and branding metadata
async fn seed_sources(pool: &SqlitePool) -> anyhow::Result<()> {
    if count(pool, "sources").await? > 0 {
        tracing::info!("sources already exist, skipping source seeding");
        return Ok(());
    }

    let sources = [
        ("ABC News", "https://abcnews.go.com", false),
        ("Apple", "https://www.apple.com/newsroom/", false),
        ("Los Angeles Times", "https://www.latimes.com", true),
        ("NBC News", "https://www.nbcnews.com", false),
        ("NPR", "https://www.npr.org", false),
        ("BBC", "https://www.bbc.com", false),
        ("CNN", "https://www.cnn.com", false),
        ("The New York Times", "https://www.nytimes.com", true),
        ("The Hacker News", "https://thehackernews.com/", false),
        ("Bloomberg", "https://www.bloomberg.com", true),
        ("Good Morning America", "https://abcnews.go.com/GMA", false),
    ];

    for (name, url, subscription_required) in sources {
        sqlx::query(
            "INSERT INTO sources (name, url, subscription_required, logo_url) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(url)
        .bind(subscription_required)
        .bind(Option::<String>::None)
        .execute(pool)
        .await?;
    }

    tracing::info!("created {} news sources", sources.len());
    Ok(())
}

/// Sample articles spanning every category, newest first. Summaries are
/// pre-rendered text; the summarization pipeline that produces them in
/// production runs outside this service.
async fn seed_articles(pool: &SqlitePool) -> anyhow::Result<()> {
    if count(pool, "articles").await? > 0 {
        tracing::info!("articles already exist, skipping article seeding");
        return Ok(());
    }

    let mut category_ids: HashMap<String, i64> = HashMap::new();
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM categories")
        .fetch_all(pool)
        .await?;
    for (id, name) in rows {
        category_ids.insert(name, id);
    }

    let mut source_ids: HashMap<String, i64> = HashMap::new();
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM sources")
        .fetch_all(pool)
        .await?;
    for (id, name) in rows {
        source_ids.insert(name, id);
    }

    // (title, category, source, url, summary)
    let articles = [
        (
            "Fed Holds Rates Steady as Inflation Cools",
            "Business",
            "Bloomberg",
            "https://www.bloomberg.com/news/fed-holds-rates",
            "The central bank left interest rates unchanged, citing softer inflation data and a resilient labor market.",
        ),
        (
            "Small Businesses Brace for New Tariff Rules",
            "Business",
            "CNN",
            "https://www.cnn.com/business/tariff-rules-small-business",
            "Importers are stockpiling inventory ahead of tariff changes expected to raise costs across retail.",
        ),
        (
            "Apple Unveils Next-Generation Silicon for AI Workloads",
            "Technology",
            "Apple",
            "https://www.apple.com/newsroom/next-gen-silicon",
            "The new chip family doubles on-device inference throughput while cutting power draw by a third.",
        ),
        (
            "Critical Flaw Patched in Widely Used VPN Appliances",
            "Technology",
            "The Hacker News",
            "https://thehackernews.com/vpn-appliance-flaw",
            "Researchers disclosed a remote code execution bug; vendors shipped fixes and urged immediate upgrades.",
        ),
        (
            "Hospitals Expand Telehealth Programs for Rural Patients",
            "Health",
            "NPR",
            "https://www.npr.org/health/telehealth-rural-expansion",
            "Federal grants are funding virtual clinics that connect rural patients with specialists hundreds of miles away.",
        ),
        (
            "New Guidelines Reshape Blood Pressure Treatment",
            "Health",
            "ABC News",
            "https://abcnews.go.com/health/blood-pressure-guidelines",
            "Updated recommendations lower the threshold for medication in adults over fifty.",
        ),
        (
            "Underdogs Stun Defending Champions in Overtime Thriller",
            "Sports",
            "NBC News",
            "https://www.nbcnews.com/sports/overtime-thriller",
            "A last-second field goal capped a comeback from a 17-point deficit.",
        ),
        (
            "Marathon Record Falls by Nearly a Minute",
            "Sports",
            "BBC",
            "https://www.bbc.com/sport/marathon-record",
            "Perfect conditions and a new pacing strategy carried the winner to a historic finish.",
        ),
        (
            "Streaming Wars Heat Up With Surprise Studio Merger",
            "Entertainment",
            "Los Angeles Times",
            "https://www.latimes.com/entertainment/studio-merger",
            "The deal combines two major catalogs and is expected to reshape subscription pricing.",
        ),
        (
            "Summer Blockbuster Breaks Opening Weekend Records",
            "Entertainment",
            "Good Morning America",
            "https://abcnews.go.com/GMA/blockbuster-opening",
            "The sequel grossed more in three days than its predecessor did in two weeks.",
        ),
        (
            "Webb Telescope Spots Chemistry of a Distant Ocean World",
            "Science",
            "The New York Times",
            "https://www.nytimes.com/science/webb-ocean-world",
            "Spectral data hint at carbon-bearing molecules in the atmosphere of a sub-Neptune exoplanet.",
        ),
        (
            "Lab-Grown Neurons Restore Movement in Paralyzed Mice",
            "Science",
            "BBC",
            "https://www.bbc.com/science/lab-grown-neurons",
            "The transplanted cells formed working circuits across damaged spinal tissue.",
        ),
        (
            "Senate Passes Sweeping Infrastructure Package",
            "Politics",
            "CNN",
            "https://www.cnn.com/politics/infrastructure-package",
            "The bipartisan bill funds bridges, broadband, and grid upgrades over the next decade.",
        ),
        (
            "Election Officials Push Back on Funding Cuts",
            "Politics",
            "NPR",
            "https://www.npr.org/politics/election-funding",
            "County clerks warn that reduced budgets threaten equipment upgrades before the next cycle.",
        ),
        (
            "Coral Restoration Effort Shows First Signs of Success",
            "Environment",
            "BBC",
            "https://www.bbc.com/environment/coral-restoration",
            "Nursery-grown corals transplanted two years ago are now spawning on their own.",
        ),
        (
            "Record Heat Strains Power Grids Across Three Continents",
            "Environment",
            "The New York Times",
            "https://www.nytimes.com/climate/record-heat-grids",
            "Utilities ordered rolling conservation measures as demand for cooling surged.",
        ),
    ];

    let base = Utc::now();
    for (i, (title, category, source, url, summary)) in articles.into_iter().enumerate() {
        let category_id = category_ids
            .get(category)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("missing required category: {}", category))?;
        let source_id = source_ids
            .get(source)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("missing required source: {}", source))?;
        let published_at = base - Duration::hours(6 * i as i64);

        sqlx::query(
            "INSERT INTO articles (title, category_id, source_id, url, published_at, image_url, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(title)
        .bind(category_id)
        .bind(source_id)
        .bind(url)
        .bind(published_at)
        .bind(Option::<String>::None)
        .bind(summary)
        .execute(pool)
        .await?;

        // Keep the denormalized per-category count accurate
        sqlx::query("UPDATE categories SET article_count = article_count + 1 WHERE id = ?1")
            .bind(category_id)
            .execute(pool)
            .await?;
    }

    tracing::info!("created {} sample articles", articles.len());
    Ok(())
}
