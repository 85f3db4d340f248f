use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::analytics::{apply, build_charts, compute_stats, ChartBundle, SortKey, TradeStats};
use crate::errors::AppError;
use crate::models::{AuthUser, Trade};
use crate::AppState;

use super::parse_filter;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Rolling win-rate window; defaults to `ROLLING_WINDOW`.
    pub window: Option<usize>,
    pub ticker: Option<String>,
    pub direction: Option<String>,
}

/// The caller's trades, filtered, oldest first.
async fn chronological(
    state: &AppState,
    user: &AuthUser,
    query: &AnalyticsQuery,
) -> Result<Vec<Trade>, AppError> {
    let filter = parse_filter(query.ticker.as_deref(), query.direction.as_deref())?;
    let trades = state.store.list_trades(user.id).await?;
    Ok(apply(&trades, &filter, Some(SortKey::TimestampAsc)))
}

/// GET /api/analytics/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<TradeStats>, AppError> {
    let trades = chronological(&state, &user, &query).await?;
    let window = query.window.unwrap_or(state.config.rolling_window);

    Ok(Json(compute_stats(&trades, window)))
}

/// GET /api/analytics/charts
pub async fn charts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ChartBundle>, AppError> {
    let trades = chronological(&state, &user, &query).await?;
    let window = query.window.unwrap_or(state.config.rolling_window);

    Ok(Json(build_charts(&trades, window, Utc::now().date_naive())))
}
