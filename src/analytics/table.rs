use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Trade;

pub const EMPTY_TABLE_MESSAGE: &str = "No trades logged yet.";
pub const CLEAR_ALL_PROMPT: &str =
    "Are you sure you want to delete all your trades? This cannot be undone.";

/// One row of the trade history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableRow {
    Trade {
        id: Uuid,
        ticker: String,
        direction: String,
        size: String,
        pnl: String,
        notes: String,
    },
    Placeholder {
        message: String,
    },
}

pub fn render_rows(trades: &[Trade]) -> Vec<TableRow> {
    if trades.is_empty() {
        return vec![TableRow::Placeholder {
            message: EMPTY_TABLE_MESSAGE.into(),
        }];
    }

    trades
        .iter()
        .map(|t| TableRow::Trade {
            id: t.id,
            ticker: t.ticker.clone(),
            direction: t.direction.to_string(),
            size: format_size(t.size),
            pnl: format_pnl(t.pnl),
            notes: t.notes.clone().unwrap_or_default(),
        })
        .collect()
}

/// Two decimal places, half away from zero; blank when the record carries no P&L.
pub fn format_pnl(pnl: Option<Decimal>) -> String {
    match pnl {
        Some(value) => {
            let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        None => String::new(),
    }
}

fn format_size(size: Option<Decimal>) -> String {
    match size {
        Some(s) if !s.is_zero() => s.normalize().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use rust_decimal_macros::dec;

    fn trade(pnl: Option<Decimal>, notes: Option<&str>) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            ticker: "AAPL".into(),
            direction: Direction::Short,
            entry: Some(dec!(10)),
            exit: Some(dec!(9)),
            size: Some(dec!(2.50)),
            pnl,
            notes: notes.map(Into::into),
            strategy: None,
            entry_date: None,
            exit_date: None,
            trade_time: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_empty_renders_placeholder() {
        assert_eq!(
            render_rows(&[]),
            vec![TableRow::Placeholder {
                message: EMPTY_TABLE_MESSAGE.into()
            }]
        );
    }

    #[test]
    fn test_row_fields() {
        let t = trade(Some(dec!(12.345)), Some("breakout"));
        let rows = render_rows(std::slice::from_ref(&t));
        assert_eq!(
            rows,
            vec![TableRow::Trade {
                id: t.id,
                ticker: "AAPL".into(),
                direction: "short".into(),
                size: "2.5".into(),
                pnl: "12.35".into(),
                notes: "breakout".into(),
            }]
        );
    }

    #[test]
    fn test_format_pnl() {
        assert_eq!(format_pnl(Some(dec!(10))), "10.00");
        assert_eq!(format_pnl(Some(dec!(-3.1))), "-3.10");
        assert_eq!(format_pnl(Some(dec!(0.005))), "0.01");
        assert_eq!(format_pnl(None), "");
    }

    #[test]
    fn test_absent_pnl_is_blank_even_with_prices() {
        let rows = render_rows(&[trade(None, None)]);
        match &rows[0] {
            TableRow::Trade { pnl, notes, .. } => {
                assert_eq!(pnl, "");
                assert_eq!(notes, "");
            }
            other => panic!("unexpected row: {other:?}"),
        }
    }
}
