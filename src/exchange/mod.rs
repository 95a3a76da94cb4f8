pub mod binance;
pub mod client;
pub mod synthetic;
