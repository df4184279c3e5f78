pub mod json_file;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::activity::ActivityLog;
use crate::market::types::Market;

pub use json_file::JsonFileRepository;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt activity file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode activity log: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable home of each market's activity log.
///
/// `save` always replaces the whole log; there are no partial writes.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Returns an empty log when nothing has been saved yet.
    async fn load(&self, market: Market) -> Result<ActivityLog, PersistenceError>;

    async fn save(&self, market: Market, log: &ActivityLog) -> Result<(), PersistenceError>;
}
