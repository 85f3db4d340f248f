use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Direction, Trade};

/// Criteria for narrowing a trade list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// Exact ticker, compared case-insensitively.
    pub ticker: Option<String>,
    pub direction: Option<Direction>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        let ticker_ok = match self.ticker.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => trade.ticker.trim().to_uppercase() == wanted.to_uppercase(),
        };
        let direction_ok = self.direction.map_or(true, |d| trade.direction == d);
        ticker_ok && direction_ok
    }

    pub fn is_empty(&self) -> bool {
        self.ticker.as_deref().map_or(true, |t| t.trim().is_empty()) && self.direction.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    TimestampDesc,
    TimestampAsc,
    TickerAsc,
    TickerDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::TimestampDesc => "timestamp_desc",
            SortKey::TimestampAsc => "timestamp_asc",
            SortKey::TickerAsc => "ticker_asc",
            SortKey::TickerDesc => "ticker_desc",
        }
    }

    /// Unknown keys yield `None`, which [`sort_trades`] treats as "keep order".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "timestamp_desc" => Some(SortKey::TimestampDesc),
            "timestamp_asc" => Some(SortKey::TimestampAsc),
            "ticker_asc" => Some(SortKey::TickerAsc),
            "ticker_desc" => Some(SortKey::TickerDesc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsequence of `trades` matching `filter`, in the original order.
pub fn filter_trades(trades: &[Trade], filter: &TradeFilter) -> Vec<Trade> {
    trades.iter().filter(|t| filter.matches(t)).cloned().collect()
}

/// A sorted copy of `trades`. The sort is stable; `None` keeps input order.
/// Records without any date order before dated ones.
pub fn sort_trades(trades: &[Trade], key: Option<SortKey>) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    let Some(key) = key else {
        return sorted;
    };

    sorted.sort_by(|a, b| compare(a, b, key));
    sorted
}

fn compare(a: &Trade, b: &Trade, key: SortKey) -> Ordering {
    match key {
        SortKey::TimestampAsc => a.ordering_key().cmp(&b.ordering_key()),
        SortKey::TimestampDesc => b.ordering_key().cmp(&a.ordering_key()),
        SortKey::TickerAsc => ticker_order(a, b),
        SortKey::TickerDesc => ticker_order(b, a),
    }
}

/// Case-insensitive ticker order; the raw ticker breaks ties.
fn ticker_order(a: &Trade, b: &Trade) -> Ordering {
    a.ticker
        .to_lowercase()
        .cmp(&b.ticker.to_lowercase())
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Filter then sort, the order the journal view applies them in.
pub fn apply(trades: &[Trade], filter: &TradeFilter, key: Option<SortKey>) -> Vec<Trade> {
    sort_trades(&filter_trades(trades, filter), key)
}
