use std::fmt;
use rust_decimal::{ Decimal, RoundingStrategy };
use serde::{ Deserialize, Serialize };

use crate::error::AggregationError;

/// Number of fractional digits shown for a price or quantity column (0..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Precision(u32);

impl Precision {
    pub const MAX: u32 = 4;

    pub fn new(digits: u32) -> Result<Self, AggregationError> {
        if digits > Self::MAX {
            return Err(
                AggregationError::InvalidParameter(
                    format!("precision must be within 0..={}, got {}", Self::MAX, digits)
                )
            );
        }
        Ok(Self(digits))
    }

    /// Like [`Precision::new`] but saturates at [`Precision::MAX`]
    pub const fn clamped(digits: u32) -> Self {
        Self(if digits > Self::MAX { Self::MAX } else { digits })
    }

    #[inline]
    pub fn digits(self) -> u32 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self((self.0 + 1).min(Self::MAX))
    }

    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl TryFrom<u32> for Precision {
    type Error = AggregationError;

    fn try_from(digits: u32) -> Result<Self, Self::Error> {
        Self::new(digits)
    }
}

impl From<Precision> for u32 {
    fn from(precision: Precision) -> Self {
        precision.0
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render `value` with exactly `precision` fractional digits.
///
/// Rounds half away from zero, so `2.345` at two digits is `2.35` and `-2.345` is `-2.35`.
pub fn format_decimal(value: Decimal, precision: Precision) -> String {
    let mut rounded = value.round_dp_with_strategy(
        precision.digits(),
        RoundingStrategy::MidpointAwayFromZero
    );
    // scale is now <= digits, so this only pads with zeros
    rounded.rescale(precision.digits());
    rounded.to_string()
}
