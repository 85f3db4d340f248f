use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{apply, render_rows, SortKey, TableRow};
use crate::errors::AppError;
use crate::models::{AuthUser, Trade, TradePayload};
use crate::AppState;

use super::parse_filter;

#[derive(Debug, Default, Deserialize)]
pub struct TradeQuery {
    pub ticker: Option<String>,
    pub direction: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: u64,
}

async fn load(state: &AppState, user: &AuthUser, query: &TradeQuery) -> Result<Vec<Trade>, AppError> {
    let filter = parse_filter(query.ticker.as_deref(), query.direction.as_deref())?;
    let sort = query.sort.as_deref().and_then(SortKey::parse);

    let trades = state.store.list_trades(user.id).await?;
    Ok(apply(&trades, &filter, sort))
}

/// GET /api/trades: the caller's trades, newest first unless `sort` says otherwise
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<Vec<Trade>>, AppError> {
    Ok(Json(load(&state, &user, &query).await?))
}

/// GET /api/trades/table: rows for the trade history table
pub async fn table(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<Vec<TableRow>>, AppError> {
    let trades = load(&state, &user, &query).await?;
    Ok(Json(render_rows(&trades)))
}

/// POST /api/trades: journal a trade (native or legacy payload)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let payload: TradePayload = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Missing required fields".into()))?;
    let new = payload.normalize()?;

    let trade = state.store.create_trade(user.id, new).await?;
    counter!("trades_created_total").increment(1);
    tracing::info!(
        trade_id = %trade.id,
        user_id = %user.id,
        ticker = %trade.ticker,
        direction = %trade.direction,
        "Trade journaled"
    );

    Ok((StatusCode::CREATED, Json(trade)))
}

/// DELETE /api/trades/{id}: delete one trade
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.delete_trade(user.id, id).await? {
        return Err(AppError::NotFound("Trade not found".into()));
    }

    counter!("trades_deleted_total").increment(1);
    tracing::info!(trade_id = %id, user_id = %user.id, "Trade deleted");

    Ok(Json(DeleteResponse {
        success: true,
        deleted: 1,
    }))
}

/// DELETE /api/trades: delete every trade of the caller
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.delete_all_trades(user.id).await?;

    counter!("trades_deleted_total").increment(deleted);
    tracing::info!(user_id = %user.id, deleted, "All trades deleted");

    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}
