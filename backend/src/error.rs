use thiserror::Error;

use crate::market::binance::ExchangeError;
use crate::persistence::PersistenceError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// True for failures caused by the exchange being unreachable or returning
    /// a non-2xx status, as opposed to a body that could not be decoded.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Exchange(ExchangeError::Http(_)))
    }
}
