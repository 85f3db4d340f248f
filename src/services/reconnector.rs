use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::{self, JournalStore, StoreMode};

/// Run the reconnect loop. Periodically pings the database while the
/// journal store is degraded and replays buffered writes once it answers.
///
/// `migrate_first` is set when the database was down at startup: the
/// schema must exist before anything is replayed into it.
pub async fn run_reconnector(
    store: JournalStore,
    pool: PgPool,
    mut migrate_first: bool,
    interval_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        ticker.tick().await;

        if !store.needs_reconnect().await {
            continue;
        }

        if migrate_first {
            match db::run_migrations(&pool).await {
                Ok(()) => {
                    tracing::info!("Reconnector: migrations applied");
                    migrate_first = false;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Reconnector: database still unreachable");
                    continue;
                }
            }
        }

        let pending = store.pending_writes().await;
        match store.reconnect().await {
            StoreMode::Connected => {
                tracing::info!(pending, "Reconnector: journal store back on Postgres");
            }
            mode => {
                tracing::debug!(?mode, pending, "Reconnector: store still degraded");
            }
        }
    }
}
