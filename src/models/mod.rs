pub mod trade;
pub mod user;

pub use trade::{LegacyTradeInput, NativeTradeInput, NewTrade, Trade, TradePayload, ValidationError};
pub use user::{AuthUser, User};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// Case-insensitive parse of `long` / `short`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "long" => Some(Direction::Long),
            "short" => Some(Direction::Short),
            _ => None,
        }
    }

    /// Sign applied to a raw price move: +1 for long, -1 for short.
    pub fn sign(&self) -> i64 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_is_case_insensitive() {
        assert_eq!(Direction::parse("LONG"), Some(Direction::Long));
        assert_eq!(Direction::parse(" Short "), Some(Direction::Short));
        assert_eq!(Direction::parse("flat"), None);
    }

    #[test]
    fn test_direction_serde_lowercase() {
        let json = serde_json::to_string(&Direction::Short).unwrap();
        assert_eq!(json, "\"short\"");
        let parsed: Direction = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(parsed, Direction::Long);
    }
}
