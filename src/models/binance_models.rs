use std::str::FromStr;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::enums::side::Side;
use crate::error::FetchError;
use super::level::Level;
use super::snapshot::Snapshot;

/// Snapshot of an orderbook from Binance REST API
#[derive(Debug, Deserialize)]
pub struct BinanceOrderbookSnapshot {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,

    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

impl BinanceOrderbookSnapshot {
    /// Decode a raw `/v3/depth` response body
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Validate the payload and convert every level to exact decimals.
    /// The aggregation engine is never handed a snapshot that fails here.
    pub fn into_snapshot(self, symbol: &str) -> Result<Snapshot, FetchError> {
        let bids = parse_side(&self.bids, Side::Bid)?;
        let asks = parse_side(&self.asks, Side::Ask)?;

        if bids.is_empty() {
            return Err(FetchError::EmptyBook { symbol: symbol.to_string(), side: "bid" });
        }
        if asks.is_empty() {
            return Err(FetchError::EmptyBook { symbol: symbol.to_string(), side: "ask" });
        }

        Ok(Snapshot {
            symbol: symbol.to_string(),
            last_update_id: self.last_update_id,
            bids,
            asks,
            fetched_at: Utc::now(),
        })
    }
}

fn parse_side(raw: &[[String; 2]], side: Side) -> Result<Vec<Level>, FetchError> {
    let mut levels = Vec::with_capacity(raw.len());

    for [price, quantity] in raw {
        let malformed = |reason: String| FetchError::MalformedLevel {
            side: side.into(),
            price: price.clone(),
            quantity: quantity.clone(),
            reason,
        };

        // Never go through f64 here: bucket edges are sensitive to sub-cent drift
        let p = Decimal::from_str(price).map_err(|e| malformed(e.to_string()))?;
        let q = Decimal::from_str(quantity).map_err(|e| malformed(e.to_string()))?;

        if p.is_sign_negative() || p.is_zero() {
            return Err(malformed("price must be positive".to_string()));
        }
        if q.is_sign_negative() {
            return Err(malformed("quantity must not be negative".to_string()));
        }

        levels.push(Level::new(p, q));
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BODY: &str =
        r#"{
        "lastUpdateId": 1027024,
        "bids": [["4.00000000", "431.00000000"], ["3.99000000", "12.50000000"]],
        "asks": [["4.00000200", "12.00000000"]]
    }"#;

    #[test]
    fn parses_depth_response_exactly() {
        let snapshot = BinanceOrderbookSnapshot::from_json(BODY)
            .unwrap()
            .into_snapshot("BNBBTC")
            .unwrap();

        assert_eq!(snapshot.symbol, "BNBBTC");
        assert_eq!(snapshot.last_update_id, 1027024);
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[1], Level::new(dec!(3.99), dec!(12.5)));
        assert_eq!(snapshot.best_ask(), Some(dec!(4.000002)));
        assert_eq!(snapshot.best_bid(), Some(dec!(4)));
    }

    #[test]
    fn missing_asks_key_is_a_decode_error() {
        let err = BinanceOrderbookSnapshot::from_json(
            r#"{"lastUpdateId": 1, "bids": [["1", "1"]]}"#
        ).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let err = BinanceOrderbookSnapshot::from_json(
            r#"{"lastUpdateId": 1, "bids": [["abc", "1"]], "asks": [["2", "1"]]}"#
        )
            .unwrap()
            .into_snapshot("ETHUSDT")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedLevel { side: "bid", .. }));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = BinanceOrderbookSnapshot::from_json(
            r#"{"lastUpdateId": 1, "bids": [["1", "1"]], "asks": [["2", "-1"]]}"#
        )
            .unwrap()
            .into_snapshot("ETHUSDT")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedLevel { side: "ask", .. }));
    }

    #[test]
    fn empty_side_is_rejected() {
        let err = BinanceOrderbookSnapshot::from_json(
            r#"{"lastUpdateId": 1, "bids": [], "asks": [["2", "1"]]}"#
        )
            .unwrap()
            .into_snapshot("ETHUSDT")
            .unwrap_err();
        assert!(matches!(err, FetchError::EmptyBook { side: "bid", .. }));
    }
}
