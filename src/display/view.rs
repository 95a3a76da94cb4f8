use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::aggregation::aggregate_with;
use crate::enums::side::Side;
use crate::error::AggregationError;
use crate::models::level::AggregatedLevel;
use crate::models::snapshot::Snapshot;
use super::format::{ format_decimal, Precision };
use super::settings::DisplaySettings;

/// One aggregated level ready for the ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthRow {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Running total from the best price outward
    pub cumulative: Decimal,
    /// Quantity relative to the largest displayed row on the same side, in `[0, 1]`
    pub depth_ratio: f64,
}

/// Row with price and quantities already rendered as fixed-point strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub side: Side,
    pub price: String,
    pub quantity: String,
    pub cumulative: String,
    pub depth_ratio: f64,
}

/// Display-ready ladder: asks on top, bids below, both descending by price
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthView {
    pub asks: Vec<DepthRow>,
    pub bids: Vec<DepthRow>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub mid_price: Option<Decimal>,
    pub spread: Option<Decimal>,
}

impl DepthView {
    /// Rank, truncate and annotate two aggregated sides.
    ///
    /// Bids keep the `levels_to_show` highest prices, asks the `levels_to_show` lowest. Both
    /// come out in descending price order. Fails only when mid, spread or a cumulative total
    /// leaves the `Decimal` range.
    pub fn assemble(
        mut bids: Vec<AggregatedLevel>,
        mut asks: Vec<AggregatedLevel>,
        levels_to_show: usize
    ) -> Result<Self, AggregationError> {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| b.price.cmp(&a.price));

        let best_bid = bids.first().map(|l| l.price);
        let best_ask = asks.last().map(|l| l.price);

        let (mid_price, spread) = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => {
                let mid = bid
                    .checked_add(ask)
                    .and_then(|sum| sum.checked_div(dec!(2)))
                    .ok_or_else(|| overflow("mid price", bid, ask))?;
                let spread = ask.checked_sub(bid).ok_or_else(|| overflow("spread", bid, ask))?;
                (Some(mid), Some(spread))
            }
            _ => (None, None),
        };

        bids.truncate(levels_to_show);
        let keep_from = asks.len().saturating_sub(levels_to_show);
        let asks = asks.split_off(keep_from);

        Ok(Self {
            bids: annotate(&bids, Side::Bid)?,
            asks: annotate(&asks, Side::Ask)?,
            best_bid,
            best_ask,
            mid_price,
            spread,
        })
    }

    /// Aggregate both sides of a snapshot and assemble the ladder
    pub fn from_snapshot(
        snapshot: &Snapshot,
        settings: &DisplaySettings
    ) -> Result<Self, AggregationError> {
        let bids = aggregate_with(&snapshot.bids, settings.step, Side::Bid)?;
        let asks = aggregate_with(&snapshot.asks, settings.step, Side::Ask)?;
        Self::assemble(bids, asks, settings.levels_to_show)
    }

    /// Ask rows followed by bid rows, formatted at the given precisions
    pub fn render_rows(
        &self,
        price_precision: Precision,
        quantity_precision: Precision
    ) -> Vec<DisplayRow> {
        self.asks
            .iter()
            .chain(self.bids.iter())
            .map(|row| DisplayRow {
                side: row.side,
                price: format_decimal(row.price, price_precision),
                quantity: format_decimal(row.quantity, quantity_precision),
                cumulative: format_decimal(row.cumulative, quantity_precision),
                depth_ratio: row.depth_ratio,
            })
            .collect()
    }
}

fn overflow(what: &str, bid: Decimal, ask: Decimal) -> AggregationError {
    AggregationError::Overflow(format!("{} of bid {} and ask {}", what, bid, ask))
}

/// `levels` must already be in descending price order
fn annotate(levels: &[AggregatedLevel], side: Side) -> Result<Vec<DepthRow>, AggregationError> {
    let max_quantity = levels
        .iter()
        .map(|l| l.quantity)
        .max()
        .unwrap_or(Decimal::ZERO);

    let ratio = |quantity: Decimal| -> f64 {
        if max_quantity.is_zero() {
            return 0.0;
        }
        (quantity / max_quantity).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
    };

    let mut rows: Vec<DepthRow> = levels
        .iter()
        .map(|l| DepthRow {
            side,
            price: l.price,
            quantity: l.quantity,
            cumulative: Decimal::ZERO,
            depth_ratio: ratio(l.quantity),
        })
        .collect();

    // Best bid is the first row, best ask the last one
    let mut running = Decimal::ZERO;
    let mut accumulate = |row: &mut DepthRow| -> Result<(), AggregationError> {
        running = running
            .checked_add(row.quantity)
            .ok_or_else(|| {
                AggregationError::Overflow(format!("cumulative {} depth at {}", side, row.price))
            })?;
        row.cumulative = running;
        Ok(())
    };
    match side {
        Side::Bid => rows.iter_mut().try_for_each(&mut accumulate)?,
        Side::Ask => rows.iter_mut().rev().try_for_each(&mut accumulate)?,
    }

    Ok(rows)
}
