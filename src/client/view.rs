use crate::analytics::table::{render_rows, TableRow, CLEAR_ALL_PROMPT};
use crate::analytics::{apply, SortKey, TradeFilter};
use crate::models::Trade;

use super::{ClientError, FetchTicket, JournalClient, TradeCache, TradeForm};

pub const CLEAR_ALL_FAILED: &str = "Failed to delete all trades.";

/// Result of the "Clear All Trades" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    /// Server confirmed; carries the re-rendered table.
    Cleared(Vec<TableRow>),
    /// Server refused or was unreachable; the cached trades are untouched.
    Failed(String),
}

/// State behind the journal page: the API client, the trade cache and the
/// current filter/sort selection.
pub struct JournalView {
    client: JournalClient,
    cache: TradeCache,
    pub filter: TradeFilter,
    pub sort: Option<SortKey>,
    status: String,
}

impl JournalView {
    pub fn new(client: JournalClient) -> Self {
        Self {
            client,
            cache: TradeCache::new(),
            filter: TradeFilter::default(),
            sort: Some(SortKey::TimestampDesc),
            status: String::new(),
        }
    }

    pub fn client(&self) -> &JournalClient {
        &self.client
    }

    pub fn cache(&self) -> &TradeCache {
        &self.cache
    }

    /// Last status line shown to the user.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Reset filter and sort to their defaults.
    pub fn clear_filters(&mut self) {
        self.filter = TradeFilter::default();
        self.sort = Some(SortKey::TimestampDesc);
    }

    /// Refetch trades. A response that lost the race to a newer fetch is
    /// dropped by the cache.
    /// Returns the number of trades now cached.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        let previous = std::mem::replace(&mut self.status, "Loading trades...".into());
        let ticket = self.cache.begin_fetch().await;
        let fetched = self.client.list_trades().await;
        self.finish_refresh(ticket, previous, fetched).await
    }

    async fn finish_refresh(
        &mut self,
        ticket: FetchTicket,
        previous_status: String,
        fetched: Result<Vec<Trade>, ClientError>,
    ) -> Result<usize, ClientError> {
        match fetched {
            Ok(trades) => {
                let n = trades.len();
                if self.cache.complete(ticket, trades).await {
                    self.status = format!("Loaded {n} trades.");
                    Ok(n)
                } else {
                    self.status = previous_status;
                    Ok(self.cache.snapshot().await.len())
                }
            }
            Err(e) => {
                self.status = format!("Error loading trades: {e}");
                Err(e)
            }
        }
    }

    /// Cached trades with the current filter and sort applied.
    pub async fn visible_trades(&self) -> Vec<Trade> {
        apply(&self.cache.snapshot().await, &self.filter, self.sort)
    }

    pub async fn rows(&self) -> Vec<TableRow> {
        render_rows(&self.visible_trades().await)
    }

    /// Validate the form, submit it and refresh the list.
    pub async fn submit(&mut self, form: &TradeForm) -> Result<Trade, ClientError> {
        let input = match form.parse() {
            Ok(input) => input,
            Err(e) => {
                self.status = e.to_string();
                return Err(e);
            }
        };

        let trade = match self.client.create_trade(&input).await {
            Ok(trade) => trade,
            Err(e) => {
                self.status = format!("Error logging trade: {e}");
                return Err(e);
            }
        };

        // A failed reload leaves its own status; the trade itself is saved.
        if self.refresh().await.is_ok() {
            self.status = "Trade logged successfully.".into();
        }
        Ok(trade)
    }

    /// Delete every trade after `confirm` approves [`CLEAR_ALL_PROMPT`].
    pub async fn clear_all(&mut self, confirm: impl FnOnce(&str) -> bool) -> ClearOutcome {
        if !confirm(CLEAR_ALL_PROMPT) {
            return ClearOutcome::Cancelled;
        }

        match self.client.delete_all_trades().await {
            Ok(deleted) => {
                tracing::debug!(deleted, "All trades cleared");
                let ticket = self.cache.begin_fetch().await;
                self.cache.complete(ticket, Vec::new()).await;
                ClearOutcome::Cleared(self.rows().await)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Clear all trades failed");
                self.status = CLEAR_ALL_FAILED.into();
                ClearOutcome::Failed(CLEAR_ALL_FAILED.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn trade(ticker: &str) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            ticker: ticker.into(),
            direction: Direction::Long,
            entry: None,
            exit: None,
            size: None,
            pnl: Some(Decimal::ONE),
            notes: None,
            strategy: None,
            entry_date: None,
            exit_date: None,
            trade_time: None,
            timestamp: None,
        }
    }

    fn offline_view() -> JournalView {
        JournalView::new(JournalClient::new("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn test_current_fetch_updates_status() {
        let mut view = offline_view();
        let ticket = view.cache.begin_fetch().await;

        let n = view
            .finish_refresh(ticket, String::new(), Ok(vec![trade("AAPL"), trade("TSLA")]))
            .await
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(view.status(), "Loaded 2 trades.");
    }

    #[tokio::test]
    async fn test_superseded_fetch_keeps_status_and_count() {
        let mut view = offline_view();
        let stale = view.cache.begin_fetch().await;
        let current = view.cache.begin_fetch().await;
        assert!(view.cache.complete(current, vec![trade("MSFT")]).await);

        let n = view
            .finish_refresh(
                stale,
                "Loaded 1 trades.".into(),
                Ok(vec![trade("OLD"), trade("OLD"), trade("OLD")]),
            )
            .await
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(view.status(), "Loaded 1 trades.");
        let visible = view.visible_trades().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].ticker, "MSFT");
    }

    #[tokio::test]
    async fn test_failed_fetch_reports_error() {
        let mut view = offline_view();
        assert!(view.refresh().await.is_err());
        assert!(view.status().starts_with("Error loading trades:"));
        assert_eq!(view.cache().generation().await, 0);
    }
}
