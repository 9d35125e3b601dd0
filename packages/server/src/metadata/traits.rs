use async_trait::async_trait;
use registry_common::{Coordinate, Image, ImageFormat, ImageVersion};
use uuid::Uuid;

use super::error::MetadataError;

/// Persistence for the image → version → format hierarchy.
///
/// Every `create_*` enforces its uniqueness invariant in the store itself and
/// fails with [`MetadataError::Conflict`] on a violation, independently of
/// any lookup the caller did before.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn find_format(&self, coordinate: &Coordinate)
    -> Result<Option<ImageFormat>, MetadataError>;

    async fn find_image(&self, group: &str, name: &str) -> Result<Option<Image>, MetadataError>;

    async fn find_version(
        &self,
        image_id: Uuid,
        version_name: &str,
    ) -> Result<Option<ImageVersion>, MetadataError>;

    /// Unique on `(group, name)`.
    async fn create_image(&self, image: Image) -> Result<Image, MetadataError>;

    /// Unique on `(image_id, name)`.
    async fn create_version(&self, version: ImageVersion) -> Result<ImageVersion, MetadataError>;

    /// Unique on `(version_id, format_type)`.
    async fn create_format(&self, format: ImageFormat) -> Result<ImageFormat, MetadataError>;
}
