use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::activity::ActivityLog;
use crate::market::types::Market;
use crate::persistence::{ActivityRepository, PersistenceError};

/// Stores each market's log as a pretty-printed JSON array in `dir`.
///
/// Writes land in a sibling temp file first and are renamed over the target,
/// so a crash mid-write leaves the previous log intact.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, market: Market) -> PathBuf {
        self.dir.join(format!("{}activity.json", market.as_str()))
    }

    pub fn encode(log: &ActivityLog) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec_pretty(log)?)
    }

    pub fn decode(path: &Path, bytes: &[u8]) -> Result<ActivityLog, PersistenceError> {
        serde_json::from_slice(bytes).map_err(|source| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl ActivityRepository for JsonFileRepository {
    #[instrument(skip(self), fields(market = %market), level = "debug")]
    async fn load(&self, market: Market) -> Result<ActivityLog, PersistenceError> {
        let path = self.path_for(market);

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no activity file yet");
                return Ok(ActivityLog::default());
            }
            Err(source) => return Err(PersistenceError::Read { path, source }),
        };

        let log = Self::decode(&path, &bytes)?;
        debug!(events = log.len(), "activity file loaded");
        Ok(log)
    }

    #[instrument(skip(self, log), fields(market = %market, events = log.len()), level = "debug")]
    async fn save(&self, market: Market, log: &ActivityLog) -> Result<(), PersistenceError> {
        let path = self.path_for(market);
        let tmp = path.with_extension("json.tmp");
        let bytes = Self::encode(log)?;

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| PersistenceError::Write {
                path: tmp.clone(),
                source,
            })?;

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(bytes = bytes.len(), "activity file written");
        Ok(())
    }
}
