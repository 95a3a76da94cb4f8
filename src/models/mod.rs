pub mod binance_models;
pub mod level;
pub mod snapshot;
