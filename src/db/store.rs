use std::future::Future;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NewTrade, Trade, User};

use super::memory::MemoryStore;
use super::{is_connectivity_error, is_unique_violation, trade_repo, user_repo};

/// Where journal reads and writes are currently served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// No database configured; memory is the system of record.
    MemoryOnly,
    /// Postgres is the system of record.
    Connected,
    /// Postgres unreachable; writes buffered in memory and logged for replay.
    DegradedFallback,
    /// A reconnect attempt is in flight; writes still take the fallback path.
    Reconnecting,
}

/// A write accepted while the database was unreachable, replayed in order
/// once it is back. Every variant is idempotent on replay.
#[derive(Debug, Clone)]
enum PendingWrite {
    CreateUser(User),
    CreateTrade(Trade),
    DeleteTrade { user_id: Uuid, trade_id: Uuid },
    DeleteAllTrades { user_id: Uuid },
}

impl PendingWrite {
    fn kind(&self) -> &'static str {
        match self {
            PendingWrite::CreateUser(_) => "create_user",
            PendingWrite::CreateTrade(_) => "create_trade",
            PendingWrite::DeleteTrade { .. } => "delete_trade",
            PendingWrite::DeleteAllTrades { .. } => "delete_all_trades",
        }
    }
}

struct StoreState {
    mode: StoreMode,
    pending: Vec<PendingWrite>,
    /// Buffered writes the database refused on replay and that were dropped.
    rejected: u64,
}

enum Primary<T> {
    Done(T),
    Fallback,
}

/// Journal persistence with an explicit fallback state machine.
///
/// `Connected` → (connectivity error) → `DegradedFallback` →
/// (reconnect tick) → `Reconnecting` → (ping ok + replay) → `Connected`,
/// or back to `DegradedFallback` when the ping or replay fails.
#[derive(Clone)]
pub struct JournalStore {
    pool: Option<PgPool>,
    memory: MemoryStore,
    state: Arc<RwLock<StoreState>>,
}

impl JournalStore {
    pub fn in_memory() -> Self {
        Self::with_mode(None, StoreMode::MemoryOnly)
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::with_mode(Some(pool), StoreMode::Connected)
    }

    /// Start against a database that was unreachable at boot.
    pub fn postgres_degraded(pool: PgPool) -> Self {
        gauge!("store_degraded").set(1.0);
        Self::with_mode(Some(pool), StoreMode::DegradedFallback)
    }

    fn with_mode(pool: Option<PgPool>, mode: StoreMode) -> Self {
        Self {
            pool,
            memory: MemoryStore::new(),
            state: Arc::new(RwLock::new(StoreState {
                mode,
                pending: Vec::new(),
                rejected: 0,
            })),
        }
    }

    pub async fn mode(&self) -> StoreMode {
        self.state.read().await.mode
    }

    pub async fn pending_writes(&self) -> usize {
        self.state.read().await.pending.len()
    }

    pub async fn rejected_writes(&self) -> u64 {
        self.state.read().await.rejected
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Register a user. Returns `None` when the email is already taken.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: String,
    ) -> anyhow::Result<Option<User>> {
        if self.find_user_by_email(email).await?.is_some() {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now().trunc_subsecs(6),
        };

        let candidate = &user;
        let primary = match self
            .try_primary(|pool| async move { user_repo::insert_user(&pool, candidate).await })
            .await
        {
            Err(e) if is_unique_violation(&e) => return Ok(None),
            other => other?,
        };
        if let Primary::Done(saved) = primary {
            self.memory.put_user(saved.clone()).await;
            return Ok(Some(saved));
        }

        let mut state = self.state.write().await;
        if !self.memory.put_user(user.clone()).await {
            return Ok(None);
        }
        self.log_pending(&mut state, PendingWrite::CreateUser(user.clone()));
        Ok(Some(user))
    }

    /// Look up a user. Database hits are cached in memory so logins keep
    /// working while the database is down.
    pub async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let primary = self
            .try_primary(|pool| async move { user_repo::get_user_by_email(&pool, email).await })
            .await?;

        match primary {
            Primary::Done(Some(user)) => {
                self.memory.put_user(user.clone()).await;
                Ok(Some(user))
            }
            Primary::Done(None) => Ok(None),
            Primary::Fallback => Ok(self.memory.find_user_by_email(email).await),
        }
    }

    // -----------------------------------------------------------------------
    // Trades
    // -----------------------------------------------------------------------

    /// Persist a trade, assigning its id and timestamp.
    pub async fn create_trade(&self, user_id: Uuid, new: NewTrade) -> anyhow::Result<Trade> {
        let trade = Trade::from_new(Uuid::new_v4(), user_id, new, Utc::now().trunc_subsecs(6));

        let candidate = &trade;
        let primary = self
            .try_primary(|pool| async move { trade_repo::insert_trade(&pool, candidate).await })
            .await?;
        if let Primary::Done(saved) = primary {
            return Ok(saved);
        }

        let mut state = self.state.write().await;
        self.memory.insert_trade(trade.clone()).await;
        self.log_pending(&mut state, PendingWrite::CreateTrade(trade.clone()));
        Ok(trade)
    }

    /// A user's trades, newest first.
    pub async fn list_trades(&self, user_id: Uuid) -> anyhow::Result<Vec<Trade>> {
        let primary = self
            .try_primary(|pool| async move { trade_repo::get_trades_by_user(&pool, user_id).await })
            .await?;

        match primary {
            Primary::Done(trades) => Ok(trades),
            Primary::Fallback => Ok(self.memory.trades_for_user(user_id).await),
        }
    }

    /// Delete one trade. While degraded the delete is logged for replay and
    /// reported as applied, since rows held only by the database cannot be
    /// checked.
    pub async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> anyhow::Result<bool> {
        let primary = self
            .try_primary(|pool| async move { trade_repo::delete_trade(&pool, user_id, trade_id).await })
            .await?;
        if let Primary::Done(deleted) = primary {
            return Ok(deleted);
        }

        let mut state = self.state.write().await;
        let removed = self.memory.delete_trade(user_id, trade_id).await;
        if state.mode == StoreMode::MemoryOnly {
            return Ok(removed);
        }
        self.log_pending(&mut state, PendingWrite::DeleteTrade { user_id, trade_id });
        Ok(true)
    }

    /// Delete every trade of a user. While degraded the count only covers
    /// trades buffered in memory.
    pub async fn delete_all_trades(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let primary = self
            .try_primary(|pool| async move { trade_repo::delete_all_for_user(&pool, user_id).await })
            .await?;
        if let Primary::Done(deleted) = primary {
            return Ok(deleted);
        }

        let mut state = self.state.write().await;
        let removed = self.memory.delete_all_for_user(user_id).await;
        self.log_pending(&mut state, PendingWrite::DeleteAllTrades { user_id });
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Run `op` against Postgres when connected. A connectivity failure
    /// degrades the store and asks the caller to take the fallback path;
    /// any other error is returned as-is.
    async fn try_primary<T, F, Fut>(&self, op: F) -> anyhow::Result<Primary<T>>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let result = {
            let state = self.state.read().await;
            let pool = match &self.pool {
                Some(pool) if state.mode == StoreMode::Connected => pool.clone(),
                _ => return Ok(Primary::Fallback),
            };
            op(pool).await
        };

        match result {
            Ok(value) => Ok(Primary::Done(value)),
            Err(e) if is_connectivity_error(&e) => {
                self.degrade(&e).await;
                Ok(Primary::Fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn degrade(&self, err: &anyhow::Error) {
        let mut state = self.state.write().await;
        if state.mode == StoreMode::Connected {
            state.mode = StoreMode::DegradedFallback;
            gauge!("store_degraded").set(1.0);
            tracing::warn!(error = %err, "Database unreachable — journal switched to in-memory fallback");
        }
    }

    fn log_pending(&self, state: &mut StoreState, write: PendingWrite) {
        if state.mode == StoreMode::MemoryOnly {
            return;
        }
        counter!("store_fallback_writes_total").increment(1);
        state.pending.push(write);
        tracing::debug!(pending = state.pending.len(), "Fallback write buffered for replay");
    }

    /// Whether the reconnect service has work to do.
    pub async fn needs_reconnect(&self) -> bool {
        let state = self.state.read().await;
        match state.mode {
            StoreMode::MemoryOnly | StoreMode::Reconnecting => false,
            StoreMode::DegradedFallback => true,
            StoreMode::Connected => !state.pending.is_empty(),
        }
    }

    /// Ping the database and, when it answers, replay buffered writes.
    /// Returns the mode the store ends up in.
    pub async fn reconnect(&self) -> StoreMode {
        let Some(pool) = &self.pool else {
            return StoreMode::MemoryOnly;
        };

        {
            let mut state = self.state.write().await;
            match state.mode {
                StoreMode::MemoryOnly | StoreMode::Reconnecting => return state.mode,
                StoreMode::Connected if state.pending.is_empty() => return state.mode,
                StoreMode::Connected => {}
                StoreMode::DegradedFallback => state.mode = StoreMode::Reconnecting,
            }
        }

        // Ping without holding the lock; writes keep taking the fallback path.
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            let mut state = self.state.write().await;
            state.mode = StoreMode::DegradedFallback;
            tracing::debug!(error = %e, "Reconnect ping failed");
            return state.mode;
        }

        let mut state = self.state.write().await;
        let total = state.pending.len();
        let mut replayed = 0usize;

        while let Some(write) = state.pending.first().cloned() {
            match replay(pool, &write).await {
                Ok(()) => {
                    replayed += 1;
                    counter!("store_replayed_writes_total").increment(1);
                }
                Err(e) if is_connectivity_error(&e) => {
                    state.mode = StoreMode::DegradedFallback;
                    gauge!("store_degraded").set(1.0);
                    tracing::warn!(
                        error = %e,
                        replayed,
                        remaining = state.pending.len(),
                        "Reconciliation interrupted — database dropped again"
                    );
                    return state.mode;
                }
                Err(e) => {
                    state.rejected += 1;
                    counter!("store_rejected_writes_total").increment(1);
                    if let PendingWrite::CreateUser(user) = &write {
                        self.memory.remove_user(user.id).await;
                    }
                    tracing::error!(error = %e, write = write.kind(), "Buffered write rejected by database — dropped");
                }
            }
            state.pending.remove(0);
        }

        let cleared = self.memory.clear_trades().await;
        state.mode = StoreMode::Connected;
        gauge!("store_degraded").set(0.0);
        tracing::info!(
            replayed,
            rejected = total - replayed,
            cleared_memory_trades = cleared,
            "Database reconnected — fallback writes reconciled"
        );
        state.mode
    }
}

async fn replay(pool: &PgPool, write: &PendingWrite) -> anyhow::Result<()> {
    match write {
        PendingWrite::CreateUser(user) => {
            let inserted = user_repo::insert_user_if_absent(pool, user).await?;
            // Skipped because of the id means an earlier replay already landed;
            // skipped because of the email means someone else registered it.
            if !inserted && !user_repo::user_exists(pool, user.id).await? {
                anyhow::bail!("email already registered by another account");
            }
        }
        PendingWrite::CreateTrade(trade) => {
            trade_repo::insert_trade_if_absent(pool, trade).await?;
        }
        PendingWrite::DeleteTrade { user_id, trade_id } => {
            trade_repo::delete_trade(pool, *user_id, *trade_id).await?;
        }
        PendingWrite::DeleteAllTrades { user_id } => {
            trade_repo::delete_all_for_user(pool, *user_id).await?;
        }
    }
    Ok(())
}
