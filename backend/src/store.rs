//! File-backed record store.
//!
//! Each collection lives in a single pretty-printed JSON document
//! (`<data_dir>/<name>.json`) holding the full ordered list of records.
//! Writes are full-document replacements: the new list is written to a
//! sibling temp file and renamed over the old one, so a reader never sees
//! a half-written document.
//!
//! Every collection owns one async mutex. `load`, `save` and [`Batch`]
//! all go through it, which serializes writers per collection and keeps
//! reads from interleaving with an in-flight save.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::models::{Advertisement, Listing, PropertyRequest};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {collection}: {source}")]
    Read {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{collection} document is corrupt: {source}")]
    Parse {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {collection}: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {collection}: {source}")]
    Write {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// One persisted collection of records.
pub struct Collection<T> {
    name: &'static str,
    path: PathBuf,
    gate: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(data_dir: &Path, name: &'static str) -> Self {
        Self {
            name,
            path: data_dir.join(format!("{name}.json")),
            gate: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted records, creating an empty document if none
    /// exists yet.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        let _guard = self.gate.lock().await;
        self.read().await
    }

    /// Replaces the whole persisted document with `records`.
    pub async fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.gate.lock().await;
        self.write(records).await
    }

    /// Locks the collection and loads it for a read-modify-write cycle.
    ///
    /// The lock is held until the returned [`Batch`] is dropped, so no
    /// other load or save on this collection can run in between.
    pub async fn begin(&self) -> Result<Batch<'_, T>, StoreError> {
        let guard = self.gate.lock().await;
        let records = self.read().await?;
        Ok(Batch {
            collection: self,
            _guard: guard,
            records,
        })
    }

    async fn read(&self) -> Result<Vec<T>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| {
                error!("{} document could not be parsed: {}", self.name, source);
                StoreError::Parse {
                    collection: self.name,
                    source,
                }
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating empty {} document at {}", self.name, self.path.display());
                self.write(&[]).await?;
                Ok(Vec::new())
            }
            Err(source) => {
                error!("Failed to read {}: {}", self.name, source);
                Err(StoreError::Read {
                    collection: self.name,
                    source,
                })
            }
        }
    }

    async fn write(&self, records: &[T]) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(records).map_err(|source| StoreError::Encode {
            collection: self.name,
            source,
        })?;

        let staging = self.path.with_extension("json.tmp");
        let result = async {
            tokio::fs::write(&staging, body).await?;
            tokio::fs::rename(&staging, &self.path).await
        }
        .await;

        result.map_err(|source| {
            error!("Failed to write {}: {}", self.name, source);
            StoreError::Write {
                collection: self.name,
                source,
            }
        })
    }
}

/// A locked, loaded collection. Mutate `records`, then [`Batch::commit`].
///
/// Dropping a batch without committing discards the changes.
pub struct Batch<'a, T> {
    collection: &'a Collection<T>,
    _guard: MutexGuard<'a, ()>,
    pub records: Vec<T>,
}

impl<T> Batch<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    pub async fn commit(&self) -> Result<(), StoreError> {
        self.collection.write(&self.records).await
    }
}

/// The four collections the service persists.
#[derive(Clone)]
pub struct Store {
    pub requests: Arc<Collection<PropertyRequest>>,
    pub houses: Arc<Collection<Listing>>,
    pub lands: Arc<Collection<Listing>>,
    pub advertisements: Arc<Collection<Advertisement>>,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            requests: Arc::new(Collection::new(data_dir, "requests")),
            houses: Arc::new(Collection::new(data_dir, "houses")),
            lands: Arc::new(Collection::new(data_dir, "lands")),
            advertisements: Arc::new(Collection::new(data_dir, "advertisements")),
        }
    }

    /// Creates `data_dir` and an empty document for every missing collection.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|source| StoreError::Write {
                collection: "data directory",
                source,
            })?;

        let store = Self::new(data_dir);
        store.requests.load().await?;
        store.houses.load().await?;
        store.lands.load().await?;
        store.advertisements.load().await?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn load_creates_missing_document() {
        let dir = TempDir::new().unwrap();
        let notes: Collection<Note> = Collection::new(dir.path(), "notes");

        assert!(notes.load().await.unwrap().is_empty());
        let raw = std::fs::read_to_string(dir.path().join("notes.json")).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let notes: Collection<Note> = Collection::new(dir.path(), "notes");
        let records = vec![note("b", "شۆرش"), note("a", ""), note("c", "line\nbreak")];

        notes.save(&records).await.unwrap();

        assert_eq!(notes.load().await.unwrap(), records);
    }

    #[tokio::test]
    async fn dropped_batch_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let notes: Collection<Note> = Collection::new(dir.path(), "notes");
        notes.save(&[note("a", "kept")]).await.unwrap();

        {
            let mut batch = notes.begin().await.unwrap();
            batch.records.clear();
        }

        assert_eq!(notes.load().await.unwrap(), vec![note("a", "kept")]);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.json"), "{not json").unwrap();
        let notes: Collection<Note> = Collection::new(dir.path(), "notes");

        let err = notes.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { collection: "notes", .. }));
        // the broken document is left for inspection
        let raw = std::fs::read_to_string(dir.path().join("notes.json")).unwrap();
        assert_eq!(raw, "{not json");
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone");
        let notes: Collection<Note> = Collection::new(&gone, "notes");

        let err = notes.save(&[note("a", "x")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_batches_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let notes: Arc<Collection<Note>> = Arc::new(Collection::new(dir.path(), "notes"));
        notes.save(&[]).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let notes = notes.clone();
            tasks.push(tokio::spawn(async move {
                let mut batch = notes.begin().await.unwrap();
                batch.records.push(note(&i.to_string(), "x"));
                batch.commit().await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(notes.load().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn open_bootstraps_every_collection() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");

        Store::open(&data).await.unwrap();

        for name in ["requests", "houses", "lands", "advertisements"] {
            assert!(data.join(format!("{name}.json")).is_file(), "{name} missing");
        }
    }
}
