use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Trade, User};

/// Process-local journal used when no database is configured and as the
/// write target while the database is unreachable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    trades: Vec<Trade>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user keyed by id. Returns `false` when another
    /// user already owns the email. Emails match exactly, as the `users.email`
    /// unique constraint does.
    pub async fn put_user(&self, user: User) -> bool {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .iter()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return false;
        }

        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => inner.users.push(user),
        }
        true
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn remove_user(&self, id: Uuid) -> bool {
        let mut inner = self.inner.lock().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        inner.users.len() < before
    }

    pub async fn insert_trade(&self, trade: Trade) {
        let mut inner = self.inner.lock().await;
        tracing::debug!(trade_id = %trade.id, ticker = %trade.ticker, "Memory store: trade inserted");
        inner.trades.push(trade);
    }

    /// A user's trades, newest first.
    pub async fn trades_for_user(&self, user_id: Uuid) -> Vec<Trade> {
        let inner = self.inner.lock().await;
        let mut trades: Vec<Trade> = inner
            .trades
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        trades
    }

    pub async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> bool {
        let mut inner = self.inner.lock().await;
        let before = inner.trades.len();
        inner
            .trades
            .retain(|t| !(t.id == trade_id && t.user_id == user_id));
        inner.trades.len() < before
    }

    pub async fn delete_all_for_user(&self, user_id: Uuid) -> u64 {
        let mut inner = self.inner.lock().await;
        let before = inner.trades.len();
        inner.trades.retain(|t| t.user_id != user_id);
        (before - inner.trades.len()) as u64
    }

    /// Drop every buffered trade; users stay cached.
    pub async fn clear_trades(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let n = inner.trades.len();
        inner.trades.clear();
        n
    }

    pub async fn trade_count(&self) -> usize {
        self.inner.lock().await.trades.len()
    }
}
