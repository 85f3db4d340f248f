pub mod analytics;
pub mod auth;
pub mod health;
pub mod trades;

use crate::analytics::TradeFilter;
use crate::errors::AppError;
use crate::models::Direction;

/// Build a filter from raw `ticker` / `direction` query parameters.
/// Blank values are treated as absent.
pub(crate) fn parse_filter(
    ticker: Option<&str>,
    direction: Option<&str>,
) -> Result<TradeFilter, AppError> {
    let direction = match direction.map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Direction::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("invalid direction: {raw} (expected long or short)"))
        })?),
    };

    Ok(TradeFilter {
        ticker: ticker
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        direction,
    })
}
