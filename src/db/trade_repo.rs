use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Direction, Trade};

/// Database row for trades table.
#[derive(Debug, Clone, FromRow)]
struct TradeRow {
    id: Uuid,
    user_id: Uuid,
    ticker: String,
    direction: String,
    entry: Option<Decimal>,
    exit: Option<Decimal>,
    size: Option<Decimal>,
    pnl: Option<Decimal>,
    notes: Option<String>,
    strategy: Option<String>,
    entry_date: Option<NaiveDate>,
    exit_date: Option<NaiveDate>,
    trade_time: Option<NaiveTime>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<TradeRow> for Trade {
    type Error = anyhow::Error;

    fn try_from(row: TradeRow) -> anyhow::Result<Self> {
        let direction = Direction::parse(&row.direction)
            .ok_or_else(|| anyhow::anyhow!("trade {} has invalid direction {:?}", row.id, row.direction))?;

        Ok(Trade {
            id: row.id,
            user_id: row.user_id,
            ticker: row.ticker,
            direction,
            entry: row.entry,
            exit: row.exit,
            size: row.size,
            pnl: row.pnl,
            notes: row.notes,
            strategy: row.strategy,
            entry_date: row.entry_date,
            exit_date: row.exit_date,
            trade_time: row.trade_time,
            timestamp: Some(row.timestamp),
        })
    }
}

const INSERT_TRADE: &str = r#"
    INSERT INTO trades
        (id, user_id, ticker, direction, entry, exit, size, pnl, notes, strategy,
         entry_date, exit_date, trade_time, "timestamp")
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, COALESCE($14, NOW()))
"#;

/// Insert a new trade record.
pub async fn insert_trade(pool: &PgPool, trade: &Trade) -> anyhow::Result<Trade> {
    let sql = format!("{INSERT_TRADE} RETURNING *");
    let row = bind_trade(sqlx::query_as::<_, TradeRow>(&sql), trade)
        .fetch_one(pool)
        .await?;

    row.try_into()
}

/// Insert a trade unless a row with the same id already exists.
/// Used when replaying writes buffered while the database was down.
pub async fn insert_trade_if_absent(pool: &PgPool, trade: &Trade) -> anyhow::Result<bool> {
    let sql = format!("{INSERT_TRADE} ON CONFLICT (id) DO NOTHING RETURNING *");
    let inserted = bind_trade(sqlx::query_as::<_, TradeRow>(&sql), trade)
        .fetch_optional(pool)
        .await?;

    Ok(inserted.is_some())
}

fn bind_trade<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, TradeRow, sqlx::postgres::PgArguments>,
    trade: &'q Trade,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, TradeRow, sqlx::postgres::PgArguments> {
    query
        .bind(trade.id)
        .bind(trade.user_id)
        .bind(&trade.ticker)
        .bind(trade.direction.as_str())
        .bind(trade.entry)
        .bind(trade.exit)
        .bind(trade.size)
        .bind(trade.pnl)
        .bind(&trade.notes)
        .bind(&trade.strategy)
        .bind(trade.entry_date)
        .bind(trade.exit_date)
        .bind(trade.trade_time)
        .bind(trade.timestamp)
}

/// Get all trades for a user, newest first.
pub async fn get_trades_by_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Trade>> {
    let rows = sqlx::query_as::<_, TradeRow>(
        r#"SELECT * FROM trades WHERE user_id = $1 ORDER BY "timestamp" DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Trade::try_from).collect()
}

/// Get the N most recent trades across all users.
pub async fn get_recent_trades(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<Trade>> {
    let rows = sqlx::query_as::<_, TradeRow>(
        r#"SELECT * FROM trades ORDER BY "timestamp" DESC LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Trade::try_from).collect()
}

/// Delete one trade owned by `user_id`. Returns whether a row was removed.
pub async fn delete_trade(pool: &PgPool, user_id: Uuid, trade_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND user_id = $2")
        .bind(trade_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every trade owned by `user_id`.
pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM trades WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every trade in the journal.
pub async fn delete_all(pool: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM trades").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Count trades across all users.
pub async fn count_trades(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}
