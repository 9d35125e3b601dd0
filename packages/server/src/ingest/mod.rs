mod error;
mod resolver;

pub use error::{IngestError, IngestErrorKind};
pub use resolver::{IngestRequest, IngestResolver};
