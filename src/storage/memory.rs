//! In-process object store for local development and tests.

use super::{ObjectMeta, ObjectStore, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Map-backed [`ObjectStore`].
///
/// Objects live in memory for the lifetime of the process. Public URLs and
/// self-links mirror the GCS formats so responses look the same regardless of
/// backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: DashMap<String, Bytes>,
    public: DashSet<String>,
    deny_public: AtomicBool,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Make every subsequent `make_public` call fail with a 403, the way a
    /// bucket with uniform access control rejects per-object ACLs.
    pub fn deny_public_access(&self) {
        self.deny_public.store(true, Ordering::Relaxed);
    }

    /// Stored bytes for `name`, if the object exists.
    pub fn contents(&self, name: &str) -> Option<Bytes> {
        self.objects.get(name).map(|entry| entry.value().clone())
    }

    pub fn is_public(&self, name: &str) -> bool {
        self.public.contains(name)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self) -> Result<Vec<ObjectMeta>, StorageError> {
        let mut objects: Vec<ObjectMeta> = self
            .objects
            .iter()
            .map(|entry| ObjectMeta {
                name: entry.key().clone(),
                self_link: format!("https://www.googleapis.com/storage/v1/b/{}/o/{}", self.bucket, entry.key()),
            })
            .collect();
        // Lexicographic order, matching backend listings
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), StorageError> {
        self.objects.insert(name.to_string(), bytes);
        Ok(())
    }

    async fn make_public(&self, name: &str) -> Result<(), StorageError> {
        if self.deny_public.load(Ordering::Relaxed) {
            return Err(StorageError::Backend {
                status: 403,
                message: "public access denied".to_string(),
            });
        }
        self.public.insert(name.to_string());
        Ok(())
    }
}
