pub mod client;
pub mod errors;
pub mod types;

pub use client::{BinanceClient, ExchangeApi};
pub use errors::ExchangeError;
pub use types::*;
