//! Storage publisher contract.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Per-object upload options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// User metadata stored with the object
    pub metadata: BTreeMap<String, String>,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Destination for encoded poster bytes.
#[async_trait]
pub trait StoragePublisher: Send + Sync {
    /// Store `bytes` under `key` and return the object's public URL.
    async fn upload(&self, bytes: Vec<u8>, key: &str, options: UploadOptions) -> StorageResult<String>;
}

/// A stored object in a [`MemoryPublisher`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub options: UploadOptions,
}

/// In-process publisher for dry runs and tests.
#[derive(Debug)]
pub struct MemoryPublisher {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryPublisher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Snapshot of every stored object by key.
    pub fn objects(&self) -> BTreeMap<String, StoredObject> {
        self.objects
            .lock()
            .map(|objects| objects.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StoragePublisher for MemoryPublisher {
    async fn upload(&self, bytes: Vec<u8>, key: &str, options: UploadOptions) -> StorageResult<String> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::transient(key, "memory store poisoned"))?;
        objects.insert(key.to_string(), StoredObject { bytes, options });
        Ok(format!("{}/{}", self.base_url, key))
    }
}
