use std::str::FromStr;
use rust_decimal::Decimal;
use serde::{ Deserialize, Serialize };
use strum_macros::{ Display, EnumIter, IntoStaticStr };

use crate::error::AggregationError;

/// Bid or ask side of the book.
///
/// Each side fixes two rules of the aggregation grid:
/// - inclusion: bids use left-closed buckets `[lo, hi)`, asks use right-closed buckets `(lo, hi]`
/// - label: bids are labelled by the lower edge, asks by the upper edge
///
/// So a bid is always shown at or below its real price and an ask at or above it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    IntoStaticStr,
    EnumIter
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Index of the bucket holding `offset`, where `offset` is the distance of a price from the
    /// grid origin measured in steps. Bucket `i` spans boundaries `i` and `i + 1`.
    #[inline]
    pub fn bucket_index(self, offset: Decimal) -> Decimal {
        match self {
            Side::Bid => offset.floor(),
            Side::Ask => offset.ceil() - Decimal::ONE,
        }
    }

    /// Which edge of bucket `(lower, upper)` labels it
    #[inline]
    pub fn label(self, lower: Decimal, upper: Decimal) -> Decimal {
        match self {
            Side::Bid => lower,
            Side::Ask => upper,
        }
    }

    /// True when `price` belongs to the bucket bounded by `lower` and `upper`
    #[inline]
    pub fn contains(self, lower: Decimal, upper: Decimal, price: Decimal) -> bool {
        match self {
            Side::Bid => lower <= price && price < upper,
            Side::Ask => lower < price && price <= upper,
        }
    }
}

impl FromStr for Side {
    type Err = AggregationError;

    /// Parse from a lowercase or uppercase string ("bid"/"ask")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" | "bids" => Ok(Side::Bid),
            "ask" | "asks" => Ok(Side::Ask),
            other => Err(AggregationError::InvalidParameter(format!("unknown side: {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case("bid", Side::Bid)]
    #[case("ASK", Side::Ask)]
    #[case(" bids ", Side::Bid)]
    #[case("asks", Side::Ask)]
    fn parses_known_sides(#[case] input: &str, #[case] expected: Side) {
        assert_eq!(input.parse::<Side>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_side() {
        let err = "mid".parse::<Side>().unwrap_err();
        assert!(matches!(err, AggregationError::InvalidParameter(_)));
    }

    #[test]
    fn boundary_price_goes_down_for_bids_and_up_for_asks() {
        assert!(Side::Bid.contains(dec!(100.0), dec!(100.1), dec!(100.0)));
        assert!(!Side::Bid.contains(dec!(99.9), dec!(100.0), dec!(100.0)));
        assert!(Side::Ask.contains(dec!(99.9), dec!(100.0), dec!(100.0)));
        assert!(!Side::Ask.contains(dec!(100.0), dec!(100.1), dec!(100.0)));
    }

    #[test]
    fn every_side_round_trips_through_its_name() {
        for side in Side::iter() {
            assert_eq!(side.to_string().parse::<Side>().unwrap(), side);
        }
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Side::Bid.to_string(), "bid");
        let name: &'static str = Side::Ask.into();
        assert_eq!(name, "ask");
    }
}
