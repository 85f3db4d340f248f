use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Direction;

/// A journaled trade as persisted and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    pub ticker: String,
    pub direction: Direction,
    pub entry: Option<Decimal>,
    pub exit: Option<Decimal>,
    pub size: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub notes: Option<String>,
    pub strategy: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub trade_time: Option<NaiveTime>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Trade {
    /// Build a record from validated input plus the identity assigned by the store.
    pub fn from_new(id: Uuid, user_id: Uuid, new: NewTrade, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            ticker: new.ticker,
            direction: new.direction,
            entry: new.entry,
            exit: new.exit,
            size: new.size,
            pnl: new.pnl,
            notes: new.notes,
            strategy: new.strategy,
            entry_date: new.entry_date,
            exit_date: new.exit_date,
            trade_time: new.trade_time,
            timestamp: Some(timestamp),
        }
    }

    /// `(exit - entry) * size * sign(direction)`, when all three inputs exist.
    /// Saturates at the `Decimal` range instead of overflowing.
    pub fn derived_pnl(&self) -> Option<Decimal> {
        let (entry, exit, size) = (self.entry?, self.exit?, self.size?);
        let gross = exit.saturating_sub(entry).saturating_mul(size);
        Some(match self.direction {
            Direction::Long => gross,
            Direction::Short => -gross,
        })
    }

    /// Signed P&L used by every statistic. An explicit `pnl` is authoritative;
    /// a record with neither `pnl` nor a complete price triple contributes zero.
    pub fn signed_pnl(&self) -> Decimal {
        self.pnl
            .or_else(|| self.derived_pnl())
            .unwrap_or(Decimal::ZERO)
    }

    /// Canonical ordering key: `timestamp`, else `entry_date` at midnight UTC.
    pub fn ordering_key(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or_else(|| {
            self.entry_date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
        })
    }

    /// First usable calendar date: exit, then entry, then the record timestamp.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.exit_date
            .or(self.entry_date)
            .or_else(|| self.timestamp.map(|t| t.date_naive()))
    }
}

// ---------------------------------------------------------------------------
// Input payloads
// ---------------------------------------------------------------------------

/// Normalized, validated input for a new trade. Identity and timestamp are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub ticker: String,
    pub direction: Direction,
    pub entry: Option<Decimal>,
    pub exit: Option<Decimal>,
    pub size: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub notes: Option<String>,
    pub strategy: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub trade_time: Option<NaiveTime>,
}

/// Payload shape posted by the journal form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeTradeInput {
    pub ticker: String,
    pub direction: Option<String>,
    pub entry: Option<Decimal>,
    pub exit: Option<Decimal>,
    pub size: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub notes: Option<String>,
    pub strategy: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub trade_time: Option<NaiveTime>,
}

/// Older clients post `symbol` instead of `ticker` and usually carry only a
/// realized P&L.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTradeInput {
    pub symbol: String,
    pub entry_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub pnl: Option<Decimal>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
}

/// Every accepted input schema. Normalized once by [`TradePayload::normalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradePayload {
    Native(NativeTradeInput),
    Legacy(LegacyTradeInput),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("ticker is required")]
    MissingTicker,

    #[error("invalid direction: {0} (expected long or short)")]
    InvalidDirection(String),

    #[error("size must not be negative")]
    NegativeSize,

    #[error("either pnl or entry, exit and size are required")]
    MissingPnlInputs,

    #[error("{0} is out of range (at most 1000000000000 in absolute value)")]
    OutOfRange(&'static str),
}

/// Largest absolute price, size or P&L accepted on input. Keeps every
/// derived P&L and running total well inside the `Decimal` range.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

impl TradePayload {
    pub fn normalize(self) -> Result<NewTrade, ValidationError> {
        let new = match self {
            TradePayload::Native(input) => {
                let direction = match input.direction.as_deref().map(str::trim) {
                    None | Some("") => Direction::Long,
                    Some(raw) => Direction::parse(raw)
                        .ok_or_else(|| ValidationError::InvalidDirection(raw.to_string()))?,
                };
                NewTrade {
                    ticker: input.ticker.trim().to_string(),
                    direction,
                    entry: input.entry,
                    exit: input.exit,
                    size: input.size,
                    pnl: input.pnl,
                    notes: non_empty(input.notes),
                    strategy: non_empty(input.strategy),
                    entry_date: input.entry_date,
                    exit_date: input.exit_date,
                    trade_time: input.trade_time,
                }
            }
            TradePayload::Legacy(input) => NewTrade {
                ticker: input.symbol.trim().to_string(),
                direction: Direction::Long,
                entry: None,
                exit: None,
                size: None,
                pnl: input.pnl,
                notes: non_empty(input.notes),
                strategy: non_empty(input.strategy),
                entry_date: input.entry_date,
                exit_date: input.exit_date,
                trade_time: None,
            },
        };

        new.validate()?;
        Ok(new)
    }
}

impl NewTrade {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ticker.trim().is_empty() {
            return Err(ValidationError::MissingTicker);
        }
        if self.size.is_some_and(|s| s.is_sign_negative() && !s.is_zero()) {
            return Err(ValidationError::NegativeSize);
        }
        for (field, value) in [
            ("entry", self.entry),
            ("exit", self.exit),
            ("size", self.size),
            ("pnl", self.pnl),
        ] {
            if value.is_some_and(|v| v.abs() > max_amount()) {
                return Err(ValidationError::OutOfRange(field));
            }
        }
        let has_prices = self.entry.is_some() && self.exit.is_some() && self.size.is_some();
        if self.pnl.is_none() && !has_prices {
            return Err(ValidationError::MissingPnlInputs);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(direction: Direction, entry: Decimal, exit: Decimal, size: Decimal) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            ticker: "AAPL".into(),
            direction,
            entry: Some(entry),
            exit: Some(exit),
            size: Some(size),
            pnl: None,
            notes: None,
            strategy: None,
            entry_date: None,
            exit_date: None,
            trade_time: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_derived_pnl_sign_convention() {
        let long = trade(Direction::Long, dec!(100), dec!(105), dec!(2));
        assert_eq!(long.signed_pnl(), dec!(10));

        let short = trade(Direction::Short, dec!(50), dec!(45), dec!(1));
        assert_eq!(short.signed_pnl(), dec!(5));
    }

    #[test]
    fn test_explicit_pnl_is_authoritative() {
        let mut t = trade(Direction::Long, dec!(100), dec!(105), dec!(2));
        t.pnl = Some(dec!(-3));
        assert_eq!(t.signed_pnl(), dec!(-3));
    }

    #[test]
    fn test_missing_inputs_contribute_zero() {
        let mut t = trade(Direction::Long, dec!(100), dec!(105), dec!(2));
        t.exit = None;
        assert_eq!(t.derived_pnl(), None);
        assert_eq!(t.signed_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_ordering_key_falls_back_to_entry_date() {
        let mut t = trade(Direction::Long, dec!(1), dec!(2), dec!(1));
        t.entry_date = NaiveDate::from_ymd_opt(2025, 11, 20);
        let key = t.ordering_key().unwrap();
        assert_eq!(key.date_naive(), NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());

        let ts = Utc.with_ymd_and_hms(2025, 12, 1, 9, 30, 0).unwrap();
        t.timestamp = Some(ts);
        assert_eq!(t.ordering_key(), Some(ts));
    }

    #[test]
    fn test_native_payload_normalizes() {
        let payload: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": " TEST1 ",
            "entry": 100.5,
            "exit": 105.25,
            "size": 1,
            "direction": "LONG",
            "notes": "test native payload"
        }))
        .unwrap();

        assert!(matches!(payload, TradePayload::Native(_)));
        let new = payload.normalize().unwrap();
        assert_eq!(new.ticker, "TEST1");
        assert_eq!(new.direction, Direction::Long);
        assert_eq!(new.entry, Some(dec!(100.5)));
        assert_eq!(new.notes.as_deref(), Some("test native payload"));
    }

    #[test]
    fn test_legacy_payload_normalizes() {
        let payload: TradePayload = serde_json::from_value(serde_json::json!({
            "symbol": "TEST2",
            "entry_date": "2025-11-20",
            "exit_date": "2025-11-21",
            "pnl": 10.25,
            "strategy": "swing"
        }))
        .unwrap();

        assert!(matches!(payload, TradePayload::Legacy(_)));
        let new = payload.normalize().unwrap();
        assert_eq!(new.ticker, "TEST2");
        assert_eq!(new.pnl, Some(dec!(10.25)));
        assert_eq!(new.strategy.as_deref(), Some("swing"));
        assert_eq!(new.entry_date, NaiveDate::from_ymd_opt(2025, 11, 20));
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let blank = TradePayload::Native(NativeTradeInput {
            ticker: "  ".into(),
            direction: None,
            entry: None,
            exit: None,
            size: None,
            pnl: Some(dec!(1)),
            notes: None,
            strategy: None,
            entry_date: None,
            exit_date: None,
            trade_time: None,
        });
        assert_eq!(blank.normalize(), Err(ValidationError::MissingTicker));

        let bad_direction: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": "X", "direction": "sideways", "pnl": 1
        }))
        .unwrap();
        assert_eq!(
            bad_direction.normalize(),
            Err(ValidationError::InvalidDirection("sideways".into()))
        );

        let no_pnl: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": "X", "entry": 1, "size": 1
        }))
        .unwrap();
        assert_eq!(no_pnl.normalize(), Err(ValidationError::MissingPnlInputs));

        let negative: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": "X", "entry": 1, "exit": 2, "size": -1
        }))
        .unwrap();
        assert_eq!(negative.normalize(), Err(ValidationError::NegativeSize));
    }

    #[test]
    fn test_validation_rejects_out_of_range_amounts() {
        let huge_exit: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": "BIG", "direction": "long", "entry": "0",
            "exit": "40000000000000000000000000000", "size": "2"
        }))
        .unwrap();
        assert_eq!(huge_exit.normalize(), Err(ValidationError::OutOfRange("exit")));

        let huge_pnl: TradePayload = serde_json::from_value(serde_json::json!({
            "symbol": "BIG", "pnl": "-1000000000000.01"
        }))
        .unwrap();
        assert_eq!(huge_pnl.normalize(), Err(ValidationError::OutOfRange("pnl")));

        let at_limit: TradePayload = serde_json::from_value(serde_json::json!({
            "ticker": "BIG", "entry": "-1000000000000", "exit": "1000000000000", "size": "1000000000000"
        }))
        .unwrap();
        assert!(at_limit.normalize().is_ok());
    }

    #[test]
    fn test_derived_pnl_saturates_instead_of_overflowing() {
        let long = trade(Direction::Long, dec!(0), Decimal::MAX, dec!(2));
        assert_eq!(long.derived_pnl(), Some(Decimal::MAX));

        let short = trade(Direction::Short, dec!(0), Decimal::MAX, dec!(2));
        assert_eq!(short.derived_pnl(), Some(-Decimal::MAX));
    }
}
