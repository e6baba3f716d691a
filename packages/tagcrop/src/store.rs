//! Object storage collaborators: where raw images come from and crops go to.
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob {container}/{name} not found")]
    NotFound { container: String, name: String },
    #[error("invalid blob name {0:?}")]
    InvalidName(String),
    #[error("storage I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Containers of named blobs. `put` overwrites an existing blob of the same name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StoreError>;
    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError>;
    /// Blob names in `container`, sorted.
    async fn list(&self, container: &str) -> Result<Vec<String>, StoreError>;
}

/// Blob store backed by a directory per container under `root`.
///
/// Blob names may contain `/` to address virtual sub-directories.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, container: &str, name: &str) -> Result<PathBuf, StoreError> {
        for segment in [container, name] {
            let relative = Path::new(segment);
            let plain = relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if segment.is_empty() || !plain {
                return Err(StoreError::InvalidName(segment.to_string()));
            }
        }
        Ok(self.root.join(container).join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.blob_path(container, name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                container: container.to_string(),
                name: name.to_string(),
            }),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.blob_path(container, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        fs::write(&path, data)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }

    async fn list(&self, container: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(container);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        tokio::task::spawn_blocking(move || {
            let mut names = Vec::new();
            for entry in WalkDir::new(&dir) {
                let entry = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(&dir) {
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    names.push(name);
                }
            }
            names.sort();
            Ok::<_, StoreError>(names)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

/// In-process blob store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, container: &str, name: &str, data: Vec<u8>) {
        self.blobs
            .write()
            .await
            .insert((container.to_string(), name.to_string()), data);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .read()
            .await
            .get(&(container.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                container: container.to_string(),
                name: name.to_string(),
            })
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError> {
        self.insert(container, name, data.to_vec()).await;
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .blobs
            .read()
            .await
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, name)| name.clone())
            .collect())
    }
}
