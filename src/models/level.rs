use rust_decimal::Decimal;
use serde::{ Deserialize, Serialize };

/// A raw price level of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl Level {
    #[inline]
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// A bucket of raw levels, labelled by one of its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLevel {
    /// Bucket label (lower edge for bids, upper edge for asks)
    pub price: Decimal,
    /// Sum of raw quantities inside the bucket
    pub quantity: Decimal,
}

impl AggregatedLevel {
    #[inline]
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

impl From<AggregatedLevel> for Level {
    fn from(level: AggregatedLevel) -> Self {
        Level { price: level.price, quantity: level.quantity }
    }
}
