//! Normalized trade (deal) records.

/// Trade direction as reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Maps the feed's small integer trade-type code to a side.
    ///
    /// The mapping (1 = buy, 2 = sell) is inferred from the feed's
    /// observed behavior, not documented; unknown codes default to buy.
    #[must_use]
    pub fn from_code(code: u64) -> Self {
        if code == 2 {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }

    /// Wire name used in output records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// A single matched trade from the deals stream. Carries no relation to
/// book state; it is emitted as soon as it arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub price: f64,
    pub quantity: f64,
    pub side: TradeSide,
    /// Epoch milliseconds reported by the exchange.
    pub timestamp: i64,
}
