use std::sync::Arc;

use registry_common::storage::{BlobHandle, BlobStore, BoxReader, StorageError};
use registry_common::{Coordinate, FormatType, Image, ImageFormat, ImageVersion};
use tracing::{Instrument, debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::IngestError;
use crate::metadata::{MetadataError, MetadataStore};

/// One upload to be registered.
pub struct IngestRequest {
    pub owner_id: Uuid,
    pub group: String,
    pub name: String,
    pub version: String,
    /// Filename as sent by the client; its extension selects the format.
    pub original_filename: String,
    pub content: BoxReader,
}

/// Resolves the image → version → format hierarchy for an upload and keeps
/// blob storage and metadata consistent.
#[derive(Clone)]
pub struct IngestResolver {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl IngestResolver {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { metadata, blobs }
    }

    /// Check an upload's target before its content is read.
    ///
    /// Maps the filename to a format, validates the coordinate and rejects a
    /// format that is already registered. [`ingest`](Self::ingest) runs the
    /// same check, so callers only need this to fail fast.
    pub async fn check_duplicate(
        &self,
        group: &str,
        name: &str,
        version: &str,
        original_filename: &str,
    ) -> Result<Coordinate, IngestError> {
        let format = FormatType::from_filename(original_filename)
            .map_err(|extension| IngestError::UnsupportedFormat { extension })?;
        let coordinate = Coordinate::new(group, name, version, format)?;

        if let Some(existing) = self.metadata.find_format(&coordinate).await? {
            debug!(uri = %existing.uri, "Format already registered");
            return Err(IngestError::duplicate(existing));
        }
        Ok(coordinate)
    }

    /// Store the upload and record it as a new format.
    ///
    /// Once the blob lease is requested, the rest of the ingestion runs on a
    /// detached task: dropping the returned future does not interrupt the
    /// commit, the cleanup of a failed attempt or the lease release.
    #[instrument(
        skip_all,
        fields(group = %request.group, name = %request.name, version = %request.version)
    )]
    pub async fn ingest(&self, request: IngestRequest) -> Result<ImageFormat, IngestError> {
        let IngestRequest {
            owner_id,
            group,
            name,
            version,
            original_filename,
            content,
        } = request;

        let coordinate = self
            .check_duplicate(&group, &name, &version, &original_filename)
            .await?;

        let resolver = self.clone();
        tokio::spawn(
            async move {
                resolver
                    .store_and_commit(owner_id, coordinate, content)
                    .await
            }
            .in_current_span(),
        )
        .await
        .map_err(|e| IngestError::TaskFailed(e.to_string()))?
    }

    async fn store_and_commit(
        &self,
        owner_id: Uuid,
        coordinate: Coordinate,
        content: BoxReader,
    ) -> Result<ImageFormat, IngestError> {
        let lease = match self.blobs.lease(&coordinate).await {
            Ok(lease) => lease,
            Err(StorageError::Leased(key)) => {
                debug!(%key, "Another upload holds the blob lease");
                return Err(self.taken(&coordinate).await?);
            }
            Err(e) => return Err(e.into()),
        };

        let result = self.store_leased(owner_id, &coordinate, content).await;

        if let Err(e) = self.blobs.release(lease).await {
            warn!(error = %e, "Failed to release blob lease");
        }
        result
    }

    async fn store_leased(
        &self,
        owner_id: Uuid,
        coordinate: &Coordinate,
        content: BoxReader,
    ) -> Result<ImageFormat, IngestError> {
        // With the lease held, a blob nobody registered is left over from a
        // failed cleanup or a crash.
        if let Some(leftover) = self.blobs.locate(coordinate).await? {
            if let Some(existing) = self.metadata.find_format(coordinate).await? {
                return Err(IngestError::duplicate(existing));
            }
            warn!(key = %leftover.key, size = leftover.size, "Reclaiming unregistered blob");
            self.blobs.delete(&leftover).await?;
        }

        let handle = match self.blobs.write(coordinate, content).await {
            Ok(handle) => handle,
            Err(StorageError::AlreadyExists(key)) => {
                debug!(%key, "Blob location already taken");
                return Err(self.taken(coordinate).await?);
            }
            Err(e) => return Err(e.into()),
        };

        match self.commit(owner_id, coordinate, &handle).await {
            Ok(format) => {
                info!(
                    uri = %format.uri,
                    content_hash = %format.content_hash,
                    size = handle.size,
                    "Image format ingested"
                );
                Ok(format)
            }
            Err(err) => {
                self.compensate(&handle).await;
                Err(err)
            }
        }
    }

    /// Error for a coordinate another ingestion got to first.
    async fn taken(&self, coordinate: &Coordinate) -> Result<IngestError, IngestError> {
        Ok(match self.metadata.find_format(coordinate).await? {
            Some(existing) => IngestError::duplicate(existing),
            None => IngestError::UploadInProgress {
                uri: coordinate.uri(),
            },
        })
    }

    async fn commit(
        &self,
        owner_id: Uuid,
        coordinate: &Coordinate,
        handle: &BlobHandle,
    ) -> Result<ImageFormat, IngestError> {
        let content_hash = self.blobs.digest(handle).await?;
        let image = self.resolve_image(owner_id, coordinate).await?;
        let version = self.resolve_version(&image, coordinate).await?;

        let format = ImageFormat::new(version.id, coordinate, &content_hash);
        match self.metadata.create_format(format).await {
            Ok(format) => Ok(format),
            Err(MetadataError::Conflict(detail)) => {
                debug!(%detail, "Format registered concurrently");
                match self.metadata.find_format(coordinate).await? {
                    Some(existing) => Err(IngestError::duplicate(existing)),
                    None => Err(MetadataError::Conflict(detail).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_image(
        &self,
        owner_id: Uuid,
        coordinate: &Coordinate,
    ) -> Result<Image, IngestError> {
        let (group, name) = (coordinate.group(), coordinate.name());
        if let Some(image) = self.metadata.find_image(group, name).await? {
            return Ok(image);
        }

        match self
            .metadata
            .create_image(Image::new(owner_id, group, name))
            .await
        {
            Ok(image) => Ok(image),
            Err(MetadataError::Conflict(detail)) => {
                debug!(%detail, "Image created concurrently, re-reading");
                self.metadata
                    .find_image(group, name)
                    .await?
                    .ok_or_else(|| MetadataError::Conflict(detail).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_version(
        &self,
        image: &Image,
        coordinate: &Coordinate,
    ) -> Result<ImageVersion, IngestError> {
        let name = coordinate.version();
        if let Some(version) = self.metadata.find_version(image.id, name).await? {
            return Ok(version);
        }

        match self
            .metadata
            .create_version(ImageVersion::new(image.id, name))
            .await
        {
            Ok(version) => Ok(version),
            Err(MetadataError::Conflict(detail)) => {
                debug!(%detail, "Version created concurrently, re-reading");
                self.metadata
                    .find_version(image.id, name)
                    .await?
                    .ok_or_else(|| MetadataError::Conflict(detail).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the blob of a failed ingestion. Never fails the caller.
    async fn compensate(&self, handle: &BlobHandle) {
        match self.blobs.delete(handle).await {
            Ok(true) => debug!(key = %handle.key, "Removed blob of failed ingestion"),
            Ok(false) => warn!(key = %handle.key, "Blob of failed ingestion was already gone"),
            Err(e) => error!(
                key = %handle.key,
                error = %e,
                "Failed to remove blob of failed ingestion"
            ),
        }
    }
}
