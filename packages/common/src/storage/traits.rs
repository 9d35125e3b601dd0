use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use uuid::Uuid;

use super::error::StorageError;
use super::hash::{ContentHash, digest_reader};
use crate::image::Coordinate;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Reference to a blob persisted by a [`BlobStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobHandle {
    /// Store-relative location of the blob.
    pub key: String,
    /// Number of bytes written.
    pub size: u64,
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Exclusive right to write one coordinate's blob.
///
/// Held from before the write until the upload is committed or rolled back,
/// then handed back through [`BlobStore::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct BlobLease {
    pub key: String,
    pub token: Uuid,
}

impl BlobLease {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            token: Uuid::new_v4(),
        }
    }
}

/// Coordinate-addressed blob storage for image files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist the content under the coordinate's location.
    ///
    /// Never replaces an existing blob: if one is already stored for the
    /// coordinate this fails with [`StorageError::AlreadyExists`].
    async fn write(
        &self,
        coordinate: &Coordinate,
        reader: BoxReader,
    ) -> Result<BlobHandle, StorageError>;

    /// Open a stored blob for streaming reads.
    async fn open(&self, handle: &BlobHandle) -> Result<BoxReader, StorageError>;

    /// Hash the stored bytes (read back from storage, not from the upload).
    async fn digest(&self, handle: &BlobHandle) -> Result<ContentHash, StorageError> {
        let mut reader = self.open(handle).await?;
        digest_reader(&mut reader).await
    }

    /// Find the blob currently stored for a coordinate, if any.
    async fn locate(&self, coordinate: &Coordinate) -> Result<Option<BlobHandle>, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, handle: &BlobHandle) -> Result<bool, StorageError>;

    /// Take the write lease for a coordinate.
    ///
    /// Fails with [`StorageError::Leased`] while another live lease exists.
    async fn lease(&self, coordinate: &Coordinate) -> Result<BlobLease, StorageError>;

    /// Give a lease back. Releasing a lease that was taken over is a no-op.
    async fn release(&self, lease: BlobLease) -> Result<(), StorageError>;
}
