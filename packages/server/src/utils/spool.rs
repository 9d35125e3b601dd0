use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use registry_common::storage::BoxReader;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// An uploaded file part buffered on local disk.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
    size: u64,
}

impl SpooledFile {
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open the spooled bytes for reading.
    pub async fn open(&self) -> Result<BoxReader, AppError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        Ok(Box::new(file))
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Stream a multipart field into a temp file, rejecting it past `max_size`.
pub async fn spool_field(
    mut field: Field<'_>,
    dir: &Path,
    max_size: u64,
) -> Result<SpooledFile, AppError> {
    let mut spooled = SpooledFile {
        path: dir.join(format!("registry-upload-{}", Uuid::new_v4())),
        size: 0,
    };

    let mut temp_file = tokio::fs::File::create(&spooled.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        spooled.size += chunk.len() as u64;
        if spooled.size > max_size {
            return Err(AppError::TooLarge { limit: max_size });
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(spooled)
}
