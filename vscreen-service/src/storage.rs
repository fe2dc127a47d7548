//! Object storage for uploaded recordings
//!
//! Keys are relative, slash-separated paths (`<inviteId>/<uuid>-<filename>`).
//! Keys that could escape the storage root are rejected.

use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stored object with its declared content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes
    pub data: Bytes,
    /// Content type given at upload
    pub content_type: String,
}

/// Blob store for recordings
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> ServiceResult<()>;

    /// Load the object under `key`
    async fn get_object(&self, key: &str) -> ServiceResult<StoredObject>;
}

fn check_key(key: &str) -> ServiceResult<()> {
    let escapes = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if escapes {
        return Err(ServiceError::Storage {
            message: format!("invalid object key {:?}", key),
        });
    }
    Ok(())
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: DashMap<String, StoredObject>,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> ServiceResult<()> {
        check_key(key)?;
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> ServiceResult<StoredObject> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::Storage {
                message: format!("no object under {:?}", key),
            })
    }
}

/// Files under a root directory
///
/// Writes go to `<path>.part` first and are renamed into place, so readers
/// never observe a partially written recording. Content types are not
/// persisted; reads report the one derived from the file extension.
#[derive(Debug, Clone)]
pub struct LocalFsStorage {
    root: PathBuf,
}

impl LocalFsStorage {
    /// Storage rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> ServiceResult<PathBuf> {
        check_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }
}

#[async_trait]
impl ObjectStorage for LocalFsStorage {
    async fn put_object(&self, key: &str, data: Bytes, _content_type: &str) -> ServiceResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut part = path.clone().into_os_string();
        part.push(".part");
        let part = PathBuf::from(part);

        tokio::fs::write(&part, &data).await?;
        tokio::fs::rename(&part, &path).await?;
        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> ServiceResult<StoredObject> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path).await?;
        let content_type = if key.ends_with(".mp4") {
            "video/mp4"
        } else {
            "video/webm"
        };
        Ok(StoredObject {
            data: Bytes::from(data),
            content_type: content_type.to_string(),
        })
    }
}
