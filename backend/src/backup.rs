//! Point-in-time snapshots of every collection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Advertisement, Listing, PropertyRequest};
use crate::store::{Collection, Store, StoreError};

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backup I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode backup: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupData {
    pub requests: Vec<PropertyRequest>,
    pub houses: Vec<Listing>,
    pub lands: Vec<Listing>,
    pub advertisements: Vec<Advertisement>,
}

impl BackupData {
    pub fn total_records(&self) -> usize {
        self.requests.len() + self.houses.len() + self.lands.len() + self.advertisements.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: BackupMeta,
    pub data: BackupData,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BackupError {
    let path = path.to_path_buf();
    move |source| BackupError::Io { path, source }
}

async fn load_or_empty<T>(collection: &Collection<T>) -> Vec<T>
where
    T: Serialize + DeserializeOwned,
{
    match collection.load().await {
        Ok(records) => records,
        Err(e) => {
            warn!("Backing up {} as empty: {}", collection.name(), e);
            Vec::new()
        }
    }
}

/// Reads all four collections. One that cannot be read is captured empty.
pub async fn collect(store: &Store) -> BackupData {
    BackupData {
        requests: load_or_empty(&store.requests).await,
        houses: load_or_empty(&store.houses).await,
        lands: load_or_empty(&store.lands).await,
        advertisements: load_or_empty(&store.advertisements).await,
    }
}

/// Reads all four collections, failing on the first that cannot be read.
pub async fn load_all(store: &Store) -> Result<BackupData, StoreError> {
    Ok(BackupData {
        requests: store.requests.load().await?,
        houses: store.houses.load().await?,
        lands: store.lands.load().await?,
        advertisements: store.advertisements.load().await?,
    })
}

/// Writes `backup-<timestamp>-<id>.json` into `dir`, then prunes all but
/// the newest `keep` backups.
pub async fn write_snapshot(
    store: &Store,
    dir: &Path,
    keep: usize,
) -> Result<PathBuf, BackupError> {
    tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;

    let now = Utc::now();
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    let stamp = now.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let file = dir.join(format!("backup-{stamp}-{id}.json"));

    let snapshot = Snapshot {
        meta: BackupMeta {
            id,
            timestamp: now,
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_by: "backup-script".to_string(),
        },
        data: collect(store).await,
    };
    let body = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write(&file, body).await.map_err(io_error(&file))?;
    info!(
        "Backup written to {} ({} records)",
        file.display(),
        snapshot.data.total_records()
    );

    prune(dir, keep).await?;
    Ok(file)
}

/// Deletes the oldest backups so that at most `keep` remain. Names sort
/// chronologically.
pub async fn prune(dir: &Path, keep: usize) -> Result<Vec<PathBuf>, BackupError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error(dir))?;
    let mut backups = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error(dir))? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("backup-") && name.ends_with(".json") {
            backups.push(name);
        }
    }
    if backups.len() <= keep {
        return Ok(Vec::new());
    }

    backups.sort();
    let excess = backups.len() - keep;
    let mut removed = Vec::with_capacity(excess);
    for name in backups.into_iter().take(excess) {
        let path = dir.join(&name);
        tokio::fs::remove_file(&path).await.map_err(io_error(&path))?;
        info!("Removed old backup {}", name);
        removed.push(path);
    }
    Ok(removed)
}
