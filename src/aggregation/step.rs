use std::fmt;
use std::str::FromStr;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{ Deserialize, Serialize };

use crate::error::AggregationError;

/// Width of one aggregation bucket on the price axis. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct AggregationStep(Decimal);

impl AggregationStep {
    /// Steps offered by the UI controls
    pub const PRESETS: [AggregationStep; 5] = [
        AggregationStep(dec!(0.01)),
        AggregationStep(dec!(0.1)),
        AggregationStep(dec!(1)),
        AggregationStep(dec!(10)),
        AggregationStep(dec!(100)),
    ];

    pub fn new(value: Decimal) -> Result<Self, AggregationError> {
        if value <= Decimal::ZERO {
            return Err(
                AggregationError::InvalidParameter(
                    format!("aggregation step must be positive, got {}", value)
                )
            );
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Next coarser preset, or self when already at the coarsest one
    pub fn next(self) -> Self {
        Self::PRESETS
            .iter()
            .copied()
            .find(|preset| preset.0 > self.0)
            .unwrap_or(self)
    }

    /// Next finer preset, or self when already at the finest one
    pub fn previous(self) -> Self {
        Self::PRESETS
            .iter()
            .rev()
            .copied()
            .find(|preset| preset.0 < self.0)
            .unwrap_or(self)
    }
}

impl Default for AggregationStep {
    fn default() -> Self {
        Self::PRESETS[0]
    }
}

impl TryFrom<Decimal> for AggregationStep {
    type Error = AggregationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AggregationStep> for Decimal {
    fn from(step: AggregationStep) -> Self {
        step.0
    }
}

impl FromStr for AggregationStep {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e|
            AggregationError::InvalidParameter(format!("aggregation step {:?}: {}", s, e))
        )?;
        Self::new(value)
    }
}

impl fmt::Display for AggregationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-0.1))]
    fn non_positive_step_is_rejected(#[case] value: Decimal) {
        assert!(matches!(AggregationStep::new(value), Err(AggregationError::InvalidParameter(_))));
    }

    #[test]
    fn parses_without_float_drift() {
        let step: AggregationStep = "0.01".parse().unwrap();
        assert_eq!(step.value(), dec!(0.01));
        assert!("abc".parse::<AggregationStep>().is_err());
        assert!("0".parse::<AggregationStep>().is_err());
    }

    #[test]
    fn cycles_through_presets_and_saturates() {
        let mut step = AggregationStep::default();
        let mut seen = vec![step];
        for _ in 0..6 {
            step = step.next();
            seen.push(step);
        }
        assert_eq!(step.value(), dec!(100));
        assert_eq!(seen[1].value(), dec!(0.1));

        assert_eq!(AggregationStep::default().previous(), AggregationStep::default());
        assert_eq!(AggregationStep::new(dec!(5)).unwrap().next().value(), dec!(10));
        assert_eq!(AggregationStep::new(dec!(5)).unwrap().previous().value(), dec!(1));
    }

    #[test]
    fn display_drops_trailing_zeros() {
        assert_eq!(AggregationStep::new(dec!(0.10)).unwrap().to_string(), "0.1");
    }
}
