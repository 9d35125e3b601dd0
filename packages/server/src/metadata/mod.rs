mod database;
mod error;
mod memory;
mod traits;

pub use database::DatabaseMetadataStore;
pub use error::MetadataError;
pub use memory::InMemoryMetadataStore;
pub use traits::MetadataStore;
