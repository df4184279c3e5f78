pub mod binance;
pub mod manager;
pub mod registry;
pub mod types;
pub mod window;
