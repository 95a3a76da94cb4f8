use async_trait::async_trait;
use chrono::Utc;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::exchange::client::DepthSource;
use crate::models::level::Level;
use crate::models::snapshot::Snapshot;

/// Offline random-walk book, used by the `demo` command
pub struct SyntheticDepthSource {
    state: Mutex<SyntheticBook>,
    tick_size: Decimal,
}

struct SyntheticBook {
    rng: StdRng,
    mid: Decimal,
    update_id: u64,
}

impl SyntheticDepthSource {
    pub fn new(start_mid: Decimal, tick_size: Decimal) -> Self {
        Self::with_rng(start_mid, tick_size, StdRng::from_os_rng())
    }

    /// Deterministic book for tests
    pub fn with_seed(start_mid: Decimal, tick_size: Decimal, seed: u64) -> Self {
        Self::with_rng(start_mid, tick_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(start_mid: Decimal, tick_size: Decimal, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(SyntheticBook { rng, mid: start_mid, update_id: 0 }),
            tick_size,
        }
    }
}

#[async_trait]
impl DepthSource for SyntheticDepthSource {
    fn name(&self) -> &str {
        "Synthetic"
    }

    async fn fetch_snapshot(&self, symbol: &str, limit: u16) -> Result<Snapshot, FetchError> {
        if limit == 0 {
            return Err(FetchError::Request("limit must be positive".to_string()));
        }

        let mut book = self.state.lock().await;
        let tick = self.tick_size;

        // Drift the mid by up to 25 ticks either way, never below 50 ticks
        let drift: i64 = book.rng.random_range(-25..=25);
        book.mid = (book.mid + tick * Decimal::from(drift)).max(tick * dec!(50));
        book.update_id += 1;

        let best_bid = (book.mid / tick).floor() * tick;
        let best_ask = best_bid + tick;

        let mut bids = Vec::with_capacity(limit as usize);
        let mut asks = Vec::with_capacity(limit as usize);
        let mut bid_price = best_bid;
        let mut ask_price = best_ask;

        for _ in 0..limit {
            bids.push(Level::new(bid_price, random_quantity(&mut book.rng)));
            asks.push(Level::new(ask_price, random_quantity(&mut book.rng)));

            // Leave occasional gaps so coarse buckets differ in size
            let bid_gap: i64 = book.rng.random_range(1..=3);
            let ask_gap: i64 = book.rng.random_range(1..=3);
            bid_price -= tick * Decimal::from(bid_gap);
            ask_price += tick * Decimal::from(ask_gap);

            if bid_price <= Decimal::ZERO {
                break;
            }
        }

        Ok(Snapshot {
            symbol: symbol.to_uppercase(),
            last_update_id: book.update_id,
            bids,
            asks,
            fetched_at: Utc::now(),
        })
    }

    async fn is_operational(&self) -> bool {
        true
    }
}

fn random_quantity(rng: &mut StdRng) -> Decimal {
    Decimal::new(rng.random_range(1..=50_000), 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_uncrossed_book_on_tick_grid() {
        let source = SyntheticDepthSource::with_seed(dec!(2500), dec!(0.01), 7);

        for _ in 0..5 {
            let snapshot = source.fetch_snapshot("ethusdt", 100).await.unwrap();
            assert_eq!(snapshot.symbol, "ETHUSDT");
            assert_eq!(snapshot.bids.len(), 100);
            assert_eq!(snapshot.asks.len(), 100);

            let best_bid = snapshot.best_bid().unwrap();
            let best_ask = snapshot.best_ask().unwrap();
            assert!(best_bid < best_ask);

            for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
                assert_eq!((level.price / dec!(0.01)).fract(), Decimal::ZERO);
                assert!(level.quantity > Decimal::ZERO);
            }
        }
    }

    #[tokio::test]
    async fn update_id_increases_per_fetch() {
        let source = SyntheticDepthSource::with_seed(dec!(100), dec!(0.1), 1);
        let first = source.fetch_snapshot("BTCUSDT", 5).await.unwrap();
        let second = source.fetch_snapshot("BTCUSDT", 5).await.unwrap();
        assert!(second.last_update_id > first.last_update_id);
    }
}
