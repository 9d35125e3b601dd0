use registry_common::ImageFormat;
use registry_common::image::InvalidCoordinate;
use registry_common::storage::StorageError;
use thiserror::Error;

use crate::metadata::MetadataError;

/// Failure of an ingestion attempt.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload's file extension is not in the supported format table.
    #[error("Unsupported image format: '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// A format already exists at the coordinate.
    #[error("Image format already exists at {}", existing.uri)]
    DuplicateFormat { existing: Box<ImageFormat> },

    /// Another upload for the same coordinate holds the blob location.
    #[error("An upload for {uri} is already in progress")]
    UploadInProgress { uri: String },

    #[error("Blob storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata storage failed: {0}")]
    Metadata(#[from] MetadataError),

    /// The detached commit task panicked or was aborted.
    #[error("Ingestion task failed: {0}")]
    TaskFailed(String),
}

/// Coarse classification used by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    Validation,
    Conflict,
    Storage,
}

impl IngestError {
    pub fn kind(&self) -> IngestErrorKind {
        match self {
            Self::UnsupportedFormat { .. } | Self::InvalidCoordinate(_) => {
                IngestErrorKind::Validation
            }
            Self::DuplicateFormat { .. } | Self::UploadInProgress { .. } => {
                IngestErrorKind::Conflict
            }
            Self::Storage(_) | Self::Metadata(_) | Self::TaskFailed(_) => IngestErrorKind::Storage,
        }
    }

    pub(crate) fn duplicate(existing: ImageFormat) -> Self {
        Self::DuplicateFormat {
            existing: Box::new(existing),
        }
    }
}
