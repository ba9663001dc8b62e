//! Object-storage backends.
//!
//! The gateway talks to its bucket through the [`ObjectStore`] trait so the
//! backend can be swapped: [`GcsStore`] speaks the Google Cloud Storage JSON
//! API over HTTP, [`MemoryStore`] keeps objects in-process for local
//! development and tests. A single store handle is constructed at startup and
//! shared through [`crate::AppState`].

pub mod gcs;
pub mod memory;

pub use gcs::GcsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error as ThisError;

/// Where public object URLs point when the backend doesn't say otherwise.
pub const DEFAULT_PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Metadata for one stored object, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object name within the bucket
    pub name: String,
    /// The backend's self-link URL for the object's metadata
    pub self_link: String,
}

#[derive(ThisError, Debug)]
pub enum StorageError {
    /// Transport-level failure talking to the backend
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("storage backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

/// Client operations against a single bucket.
///
/// `put` is a single-shot, non-resumable write: the whole buffer is handed
/// over at once and the call returns only after the backend has accepted the
/// complete object. There is no delete operation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store operates on
    fn bucket(&self) -> &str;

    /// List every object in the bucket with its metadata
    async fn list(&self) -> Result<Vec<ObjectMeta>, StorageError>;

    /// Write a complete object under `name`, replacing any existing one
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), StorageError>;

    /// Mark the object publicly readable
    async fn make_public(&self, name: &str) -> Result<(), StorageError>;

    /// Canonical public URL for an object, whether or not it exists.
    ///
    /// Plain string construction - the object name is interpolated verbatim.
    fn public_url(&self, name: &str) -> String {
        format!("{}/{}/{}", DEFAULT_PUBLIC_BASE, self.bucket(), name)
    }
}
