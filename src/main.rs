use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gallery_market::{Config, GalleryState, db, gallery_router, storage};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database.url,
        storage_backend = ?cfg.storage.backend,
        bucket = %cfg.storage.bucket,
        storage_endpoint = %cfg.storage.endpoint,
        access_token = if cfg.storage.access_token.is_some() { "<set>" } else { "<none>" },
        allow_new_attributes = cfg.listings.allow_new_attributes,
        loglevel = %cfg.basic.loglevel,
    );

    let pool = db::connect(&cfg.database).await?;
    let applied = db::migrate::run(&pool).await?;
    info!(?applied, "schema migrations complete");

    let objects = storage::from_config(&cfg.storage)?;
    let state = GalleryState::new(&cfg, pool, objects).await?;
    let app = gallery_router(state);

    let listener = TcpListener::bind(cfg.basic.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
