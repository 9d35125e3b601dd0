use std::fmt;

use sha2::{Digest, Sha512};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Read buffer used when hashing streams.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

const HASH_LEN: usize = 64;

/// A SHA-512 content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Compute the SHA-512 hash of the given data.
    pub fn compute(data: &[u8]) -> Self {
        Self::from_digest(&Sha512::digest(data))
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(digest);
        Self(bytes)
    }

    /// Return the hash as a 128-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Incremental SHA-512 hasher.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha512,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash::from_digest(&self.inner.finalize())
    }
}

/// Hash everything readable from `reader` through a bounded buffer.
pub async fn digest_reader<R>(reader: &mut R) -> Result<ContentHash, StorageError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
