use anyhow::Context;
use campground_ops::{build_router, AppState, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment still applies
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campground_ops=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to init tracing subscriber")?;

    let config = ServiceConfig::from_env();
    if config.ratings.api_key.is_none() {
        tracing::warn!("GOOGLE_PLACES_API_KEY is not set, ratings will degrade to cached or empty records");
    }
    if config.ratings.timeout.is_none() {
        tracing::info!("ratings provider calls have no timeout");
    }

    let state = AppState::from_config(&config).context("failed to build ratings client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("campground ops server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
