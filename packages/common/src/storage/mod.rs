mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use hash::{ContentHash, ContentHasher, HASH_BUFFER_SIZE, digest_reader};
pub use traits::{BlobHandle, BlobLease, BlobStore, BoxReader};
