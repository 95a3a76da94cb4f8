//! Ranking, truncation, shading and fixed-point rendering of aggregated depth.

pub mod format;
pub mod settings;
pub mod view;

pub use format::{ format_decimal, Precision };
pub use settings::{ DisplaySettings, SettingsChange };
pub use view::{ DepthRow, DepthView, DisplayRow };
