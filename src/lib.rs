pub mod aggregation;
pub mod app;
pub mod config;
pub mod display;
pub mod enums;
pub mod error;
pub mod exchange;
pub mod models;
pub mod tui;
pub mod utils;

pub use aggregation::{ aggregate, AggregationStep };
pub use enums::side::Side;
pub use error::{ AggregationError, FetchError };
pub use models::level::{ AggregatedLevel, Level };
