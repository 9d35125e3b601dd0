use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobHandle, BlobLease, BlobStore, BoxReader};
use crate::image::Coordinate;

/// Copy buffer for uploads.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Default age after which a lease file is treated as abandoned.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(60 * 60);

/// Filesystem-backed blob store.
///
/// Blobs live under `{root}/images/{group}/{name}/{version}/{name}-{version}.{ext}`.
/// Writes go to `{root}/.tmp` first and are published with a hard link, so a
/// blob path only ever holds complete content and is never overwritten.
///
/// Write leases are files under `{root}/.leases`, named by the SHA-512 of the
/// blob key and holding the owner's token. A lease older than the TTL is
/// taken over by the next caller.
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
    lease_ttl: Duration,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join("images")).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        fs::create_dir_all(root.join(".leases")).await?;
        Ok(Self {
            root,
            max_size,
            lease_ttl: DEFAULT_LEASE_TTL,
        })
    }

    pub fn with_lease_ttl(mut self, lease_ttl: Duration) -> Self {
        self.lease_ttl = lease_ttl;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path a coordinate's blob is (or would be) stored at.
    pub fn blob_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(coordinate.blob_key())
    }

    fn handle_path(&self, handle: &BlobHandle) -> PathBuf {
        self.root.join(&handle.key)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn lease_path(&self, key: &str) -> PathBuf {
        self.root
            .join(".leases")
            .join(ContentHash::compute(key.as_bytes()).to_hex())
    }

    /// Create the lease file. `false` when someone else's file is in the way.
    async fn create_lease(&self, path: &Path, lease: &BlobLease) -> Result<bool, StorageError> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(lease.token.to_string().as_bytes()).await?;
        file.flush().await?;
        Ok(true)
    }

    async fn lease_is_stale(&self, path: &Path) -> Result<bool, StorageError> {
        let meta = match fs::metadata(path).await {
            Ok(meta) => meta,
            // Released in the meantime.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        let age = meta.modified()?.elapsed().unwrap_or_default();
        Ok(age >= self.lease_ttl)
    }

    /// Copy the reader into `temp_path`, enforcing the size limit.
    async fn spool(&self, mut reader: BoxReader, temp_path: &Path) -> Result<u64, StorageError> {
        let mut temp_file = fs::File::create(temp_path).await?;
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut total_bytes: u64 = 0;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total_bytes)
    }

    /// Publish the temp file at `blob_path` unless something is already there.
    async fn publish(&self, temp_path: &Path, blob_path: &Path, key: &str) -> Result<(), StorageError> {
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::hard_link(temp_path, blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn write(
        &self,
        coordinate: &Coordinate,
        reader: BoxReader,
    ) -> Result<BlobHandle, StorageError> {
        let key = coordinate.blob_key();
        let blob_path = self.blob_path(coordinate);

        if fs::try_exists(&blob_path).await? {
            return Err(StorageError::AlreadyExists(key));
        }

        let temp_path = self.temp_path();
        let result = async {
            let size = self.spool(reader, &temp_path).await?;
            self.publish(&temp_path, &blob_path, &key).await?;
            Ok::<_, StorageError>(size)
        }
        .await;

        // The published blob is a second link; the temp name always goes.
        let _ = fs::remove_file(&temp_path).await;

        let size = result?;
        tracing::debug!(%key, size, "Blob written");
        Ok(BlobHandle { key, size })
    }

    async fn open(&self, handle: &BlobHandle) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.handle_path(handle)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(handle.key.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn locate(&self, coordinate: &Coordinate) -> Result<Option<BlobHandle>, StorageError> {
        let key = coordinate.blob_key();
        match fs::metadata(self.root.join(&key)).await {
            Ok(meta) => Ok(Some(BlobHandle {
                key,
                size: meta.len(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        match fs::remove_file(self.handle_path(handle)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn lease(&self, coordinate: &Coordinate) -> Result<BlobLease, StorageError> {
        let lease = BlobLease::new(coordinate.blob_key());
        let path = self.lease_path(&lease.key);

        if self.create_lease(&path, &lease).await? {
            return Ok(lease);
        }
        if !self.lease_is_stale(&path).await? {
            return Err(StorageError::Leased(lease.key));
        }

        tracing::warn!(key = %lease.key, "Taking over stale blob lease");
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if self.create_lease(&path, &lease).await? {
            Ok(lease)
        } else {
            Err(StorageError::Leased(lease.key))
        }
    }

    async fn release(&self, lease: BlobLease) -> Result<(), StorageError> {
        let path = self.lease_path(&lease.key);
        match fs::read_to_string(&path).await {
            Ok(owner) if owner == lease.token.to_string() => match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Ok(_) => {
                tracing::debug!(key = %lease.key, "Lease was taken over, leaving it");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
