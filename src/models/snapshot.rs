use chrono::{ DateTime, Utc };
use rust_decimal::Decimal;

use super::level::Level;

/// Full two-sided depth snapshot for one pair, valid for a single refresh tick
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub symbol: String,
    pub last_update_id: u64,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Highest raw bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids
            .iter()
            .map(|l| l.price)
            .max()
    }

    /// Lowest raw ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks
            .iter()
            .map(|l| l.price)
            .min()
    }
}
