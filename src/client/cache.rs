use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::Trade;

/// Proof that a fetch was started; only the most recently issued ticket may
/// overwrite the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct CacheInner {
    issued: u64,
    applied: u64,
    trades: Vec<Trade>,
}

/// Last fetched trade list, guarded by a generation counter so that a slow
/// response can never overwrite a newer one.
#[derive(Clone, Default)]
pub struct TradeCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl TradeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut inner = self.inner.write().await;
        inner.issued += 1;
        FetchTicket(inner.issued)
    }

    /// Apply a completed fetch. Returns `false` (and leaves the cache alone)
    /// when a later fetch has been issued since `ticket`.
    pub async fn complete(&self, ticket: FetchTicket, trades: Vec<Trade>) -> bool {
        let mut inner = self.inner.write().await;
        if ticket.0 != inner.issued || ticket.0 <= inner.applied {
            tracing::debug!(
                ticket = ticket.0,
                latest = inner.issued,
                "Discarding stale trade fetch"
            );
            return false;
        }

        inner.applied = ticket.0;
        inner.trades = trades;
        true
    }

    pub async fn snapshot(&self) -> Vec<Trade> {
        self.inner.read().await.trades.clone()
    }

    /// Generation of the data currently held; 0 before the first fetch lands.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.applied
    }
}
