use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::models::{Direction, NativeTradeInput};

use super::ClientError;

pub const INVALID_FORM_MESSAGE: &str = "Please fill all required fields with valid numbers.";

/// Raw field values as typed into the trade entry form.
#[derive(Debug, Clone, Default)]
pub struct TradeForm {
    pub ticker: String,
    pub direction: String,
    pub entry: String,
    pub exit: String,
    pub size: String,
    pub notes: String,
    pub strategy: String,
    pub entry_date: String,
    pub exit_date: String,
    pub trade_time: String,
}

impl TradeForm {
    /// Validate and convert to the payload the API accepts. Nothing is sent
    /// when this fails.
    pub fn parse(&self) -> Result<NativeTradeInput, ClientError> {
        let ticker = self.ticker.trim();
        let (entry, exit, size) = match (number(&self.entry), number(&self.exit), number(&self.size)) {
            (Some(entry), Some(exit), Some(size)) if !ticker.is_empty() => (entry, exit, size),
            _ => return Err(invalid(INVALID_FORM_MESSAGE)),
        };
        if size.is_sign_negative() && !size.is_zero() {
            return Err(invalid("Size must not be negative."));
        }

        let direction = match self.direction.trim() {
            "" => None,
            raw => Some(
                Direction::parse(raw)
                    .ok_or_else(|| invalid("Direction must be long or short."))?
                    .to_string(),
            ),
        };

        Ok(NativeTradeInput {
            ticker: ticker.to_string(),
            direction,
            entry: Some(entry),
            exit: Some(exit),
            size: Some(size),
            pnl: None,
            notes: text(&self.notes),
            strategy: text(&self.strategy),
            entry_date: date(&self.entry_date)?,
            exit_date: date(&self.exit_date)?,
            trade_time: time(&self.trade_time)?,
        })
    }
}

fn invalid(message: &str) -> ClientError {
    ClientError::Validation(message.into())
}

fn number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

fn text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn date(raw: &str) -> Result<Option<NaiveDate>, ClientError> {
    match raw.trim() {
        "" => Ok(None),
        s => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("Dates must be YYYY-MM-DD.")),
    }
}

fn time(raw: &str) -> Result<Option<NaiveTime>, ClientError> {
    match raw.trim() {
        "" => Ok(None),
        s => NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Some)
            .map_err(|_| invalid("Time must be HH:MM.")),
    }
}
