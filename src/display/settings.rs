use serde::{ Deserialize, Serialize };

use crate::aggregation::AggregationStep;
use super::format::Precision;

pub const DEFAULT_LEVELS_TO_SHOW: usize = 10;
pub const MAX_LEVELS_TO_SHOW: usize = 50;

/// User-adjustable parameters of one ladder render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub step: AggregationStep,
    pub price_precision: Precision,
    pub quantity_precision: Precision,
    pub levels_to_show: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            step: AggregationStep::default(),
            price_precision: Precision::clamped(2),
            quantity_precision: Precision::clamped(4),
            levels_to_show: DEFAULT_LEVELS_TO_SHOW,
        }
    }
}

/// A single control action coming from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    CoarserStep,
    FinerStep,
    MorePricePrecision,
    LessPricePrecision,
    MoreQuantityPrecision,
    LessQuantityPrecision,
    MoreLevels,
    FewerLevels,
}

impl DisplaySettings {
    /// Apply a change, returning whether anything moved
    pub fn apply(&mut self, change: SettingsChange) -> bool {
        let before = *self;
        match change {
            SettingsChange::CoarserStep => {
                self.step = self.step.next();
            }
            SettingsChange::FinerStep => {
                self.step = self.step.previous();
            }
            SettingsChange::MorePricePrecision => {
                self.price_precision = self.price_precision.increment();
            }
            SettingsChange::LessPricePrecision => {
                self.price_precision = self.price_precision.decrement();
            }
            SettingsChange::MoreQuantityPrecision => {
                self.quantity_precision = self.quantity_precision.increment();
            }
            SettingsChange::LessQuantityPrecision => {
                self.quantity_precision = self.quantity_precision.decrement();
            }
            SettingsChange::MoreLevels => {
                self.levels_to_show = (self.levels_to_show + 1).min(MAX_LEVELS_TO_SHOW);
            }
            SettingsChange::FewerLevels => {
                self.levels_to_show = self.levels_to_show.saturating_sub(1).max(1);
            }
        }
        *self != before
    }
}
