pub mod memory;
pub mod store;
pub mod trade_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use store::{JournalStore, StoreMode};

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = pool_options().connect(database_url).await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Build a pool without connecting. Used when the database is down at
/// startup so the reconnect service can bring it up later.
pub fn lazy_pool(database_url: &str) -> anyhow::Result<PgPool> {
    Ok(pool_options().connect_lazy(database_url)?)
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// True when `err` means the database could not be reached, as opposed to
/// the database rejecting the statement.
pub fn is_connectivity_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    )
}

/// True when `err` is a unique-constraint violation (duplicate email).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}
