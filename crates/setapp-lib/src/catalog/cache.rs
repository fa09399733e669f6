use super::types::CatalogDocument;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Persisted catalog plus the instant (epoch millis) it stops being fresh.
///
/// `etag` and `last_modified` are kept for future conditional requests; nothing
/// reads them yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub data: CatalogDocument,
    pub expiry: i64,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl CacheRecord {
    pub fn is_valid(&self, now_millis: i64) -> bool {
        self.expiry > now_millis
    }
}

/// Single-file catalog cache.
///
/// Reads fail soft: anything short of a well-formed record is reported as
/// "no cache". Bad files are left alone and simply overwritten by the next
/// successful fetch.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Option<CacheRecord> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No catalog cache at {:?}", self.path);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read catalog cache {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheRecord>(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Ignoring malformed catalog cache {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub async fn save(&self, record: &CacheRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create cache directory")?;
        }

        let json =
            serde_json::to_string_pretty(record).context("Failed to serialize catalog cache")?;

        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write catalog cache {:?}", self.path))?;

        log::debug!("Saved catalog cache to {:?}", self.path);
        Ok(())
    }

    /// Remove the cache file. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", self.path)),
        }
    }
}
