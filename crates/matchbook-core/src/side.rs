//! Side (Buy / Sell) for orders and depth views.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order side: Buy or Sell.
///
/// The canonical text tokens are `BUY` and `SELL`; they are what the
/// audit tape writes and what the terminal front-end accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Canonical token (`BUY` / `SELL`).
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Parse a side token, case-insensitively. Accepts `BUY`/`SELL`
    /// and the single-letter forms `B`/`S`.
    pub fn parse(token: &str) -> Option<Side> {
        match token.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Some(Side::Buy),
            "SELL" | "S" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_tokens_and_letters() {
        assert_eq!(Side::parse("BUY"), Some(Side::Buy));
        assert_eq!(Side::parse("sell"), Some(Side::Sell));
        assert_eq!(Side::parse(" b "), Some(Side::Buy));
        assert_eq!(Side::parse("S"), Some(Side::Sell));
        assert_eq!(Side::parse("HOLD"), None);
    }

    #[test]
    fn display_matches_canonical_tokens() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
