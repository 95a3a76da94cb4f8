use std::collections::BTreeMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::trace;

use crate::enums::side::Side;
use crate::error::AggregationError;
use crate::models::level::{ AggregatedLevel, Level };
use super::step::AggregationStep;

/// Fixed-width bucket grid covering one side of a snapshot.
///
/// Boundaries are `origin + i * step` for `i` in `0..=bucket_count`. The origin sits one full
/// step below the floor of the lowest price, and the last boundary one step above the ceiling
/// of the highest, so every raw price falls strictly inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGrid {
    origin: Decimal,
    step: Decimal,
    bucket_count: u64,
}

impl BucketGrid {
    pub fn new(
        min_price: Decimal,
        max_price: Decimal,
        step: AggregationStep
    ) -> Result<Self, AggregationError> {
        let step = step.value();
        let out_of_range = || {
            AggregationError::Overflow(
                format!("price range [{}, {}] cannot be gridded at step {}", min_price, max_price, step)
            )
        };

        let lower_steps = min_price
            .checked_div(step)
            .and_then(|v| v.checked_sub(Decimal::ONE))
            .ok_or_else(out_of_range)?
            .floor();
        let upper_steps = max_price
            .checked_div(step)
            .and_then(|v| v.checked_add(Decimal::ONE))
            .ok_or_else(out_of_range)?
            .ceil();

        let origin = lower_steps.checked_mul(step).ok_or_else(out_of_range)?;
        let bucket_count = upper_steps
            .checked_sub(lower_steps)
            .and_then(|n| n.to_u64())
            .ok_or_else(out_of_range)?;

        let grid = Self { origin, step, bucket_count };
        // Every inner boundary lies between the origin and the top one
        grid.boundary(bucket_count).map_err(|_| out_of_range())?;

        Ok(grid)
    }

    #[inline]
    pub fn origin(&self) -> Decimal {
        self.origin
    }

    #[inline]
    pub fn bucket_count(&self) -> u64 {
        self.bucket_count
    }

    /// Boundary `i` of the grid
    pub fn boundary(&self, i: u64) -> Result<Decimal, AggregationError> {
        self.step
            .checked_mul(Decimal::from(i))
            .and_then(|offset| self.origin.checked_add(offset))
            .ok_or_else(|| {
                AggregationError::Overflow(
                    format!("boundary {} of grid at {} step {}", i, self.origin, self.step)
                )
            })
    }

    /// Price that labels bucket `index` on `side`
    #[inline]
    pub fn label(&self, index: u64, side: Side) -> Result<Decimal, AggregationError> {
        Ok(side.label(self.boundary(index)?, self.boundary(index + 1)?))
    }

    /// Bucket that owns `price` on `side`.
    ///
    /// The quotient is only an estimate when it does not terminate within 28 digits, so the
    /// final choice is made by exact edge comparison against the side's inclusion rule.
    pub fn bucket_of(&self, price: Decimal, side: Side) -> Result<u64, AggregationError> {
        let offset = price
            .checked_sub(self.origin)
            .and_then(|d| d.checked_div(self.step))
            .ok_or_else(|| self.outside(price))?;
        let estimate = side.bucket_index(offset).to_i64().ok_or_else(|| self.outside(price))?;

        let candidates = [Some(estimate), estimate.checked_sub(1), estimate.checked_add(1)];
        for i in candidates.into_iter().flatten() {
            let Ok(i) = u64::try_from(i) else {
                continue;
            };
            if i >= self.bucket_count {
                continue;
            }
            if side.contains(self.boundary(i)?, self.boundary(i + 1)?, price) {
                return Ok(i);
            }
        }

        Err(self.outside(price))
    }

    fn outside(&self, price: Decimal) -> AggregationError {
        AggregationError::InvalidParameter(
            format!(
                "price {} falls outside the grid starting at {} ({} buckets of {})",
                price,
                self.origin,
                self.bucket_count,
                self.step
            )
        )
    }
}

/// Aggregate one side of the book into fixed-width buckets.
///
/// Fails with [`AggregationError::EmptyInput`] on an empty slice, with
/// [`AggregationError::InvalidParameter`] when `step` is not strictly positive and with
/// [`AggregationError::Overflow`] when the grid or a bucket sum leaves the `Decimal` range.
/// Buckets whose quantities sum to exactly zero are dropped. The output is ordered by
/// ascending label but callers should sort it themselves.
pub fn aggregate(
    levels: &[Level],
    step: Decimal,
    side: Side
) -> Result<Vec<AggregatedLevel>, AggregationError> {
    let step = AggregationStep::new(step)?;
    aggregate_with(levels, step, side)
}

/// Same as [`aggregate`] with an already validated step
pub fn aggregate_with(
    levels: &[Level],
    step: AggregationStep,
    side: Side
) -> Result<Vec<AggregatedLevel>, AggregationError> {
    let (min_price, max_price) = price_range(levels).ok_or(AggregationError::EmptyInput)?;
    let grid = BucketGrid::new(min_price, max_price, step)?;

    let mut buckets: BTreeMap<u64, Decimal> = BTreeMap::new();
    for level in levels {
        let index = grid.bucket_of(level.price, side)?;
        let total = buckets.entry(index).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(level.quantity)
            .ok_or_else(|| {
                AggregationError::Overflow(
                    format!("{} quantity sum near price {}", side, level.price)
                )
            })?;
    }

    let aggregated = buckets
        .into_iter()
        .filter(|(_, quantity)| !quantity.is_zero())
        .map(|(index, quantity)| Ok(AggregatedLevel::new(grid.label(index, side)?, quantity)))
        .collect::<Result<Vec<_>, AggregationError>>()?;

    trace!(
        %side,
        step = %step,
        raw = levels.len(),
        buckets = aggregated.len(),
        origin = %grid.origin(),
        "Aggregated levels"
    );

    Ok(aggregated)
}

fn price_range(levels: &[Level]) -> Option<(Decimal, Decimal)> {
    let first = levels.first()?.price;
    Some(
        levels
            .iter()
            .fold((first, first), |(lo, hi), level| (lo.min(level.price), hi.max(level.price)))
    )
}
