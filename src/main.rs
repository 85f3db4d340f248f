use tradejournal::api::router::create_router;
use tradejournal::config::AppConfig;
use tradejournal::db::{self, JournalStore};
use tradejournal::services::reconnector::run_reconnector;
use tradejournal::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = tradejournal::metrics::init_metrics();

    let store = match &config.database_url {
        None => {
            tracing::warn!("DATABASE_URL not set — trades are kept in memory only");
            JournalStore::in_memory()
        }
        Some(url) => {
            tracing::info!("Connecting to database...");
            let (store, pool, migrate_first) = match db::init_pool(url).await {
                Ok(pool) => {
                    db::run_migrations(&pool).await?;
                    tracing::info!("Database connected");
                    (JournalStore::postgres(pool.clone()), pool, false)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Database unreachable at startup — starting in fallback mode");
                    let pool = db::lazy_pool(url)?;
                    (JournalStore::postgres_degraded(pool.clone()), pool, true)
                }
            };

            let reconnect_store = store.clone();
            let interval_secs = config.reconnect_interval_secs;
            tokio::spawn(async move {
                run_reconnector(reconnect_store, pool, migrate_first, interval_secs).await;
            });
            tracing::info!(interval_secs, "Reconnector spawned");

            store
        }
    };

    let state = AppState {
        store,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}
