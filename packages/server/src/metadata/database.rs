use async_trait::async_trait;
use registry_common::{Coordinate, Image, ImageFormat, ImageVersion};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::error::MetadataError;
use super::traits::MetadataStore;
use crate::entity::{image, image_format, image_version};

/// SeaORM-backed metadata store.
///
/// Uniqueness is enforced by the composite unique keys declared on the
/// entities; violations surface as [`MetadataError::Conflict`].
#[derive(Clone)]
pub struct DatabaseMetadataStore {
    db: DatabaseConnection,
}

impl DatabaseMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for DatabaseMetadataStore {
    async fn find_format(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<ImageFormat>, MetadataError> {
        let Some(image) = self.find_image(coordinate.group(), coordinate.name()).await? else {
            return Ok(None);
        };
        let Some(version) = self.find_version(image.id, coordinate.version()).await? else {
            return Ok(None);
        };

        let format = image_format::Entity::find()
            .filter(image_format::Column::VersionId.eq(version.id))
            .filter(image_format::Column::FormatType.eq(coordinate.format()))
            .one(&self.db)
            .await?;

        Ok(format.map(ImageFormat::from))
    }

    async fn find_image(&self, group: &str, name: &str) -> Result<Option<Image>, MetadataError> {
        let image = image::Entity::find()
            .filter(image::Column::Group.eq(group))
            .filter(image::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(image.map(Image::from))
    }

    async fn find_version(
        &self,
        image_id: Uuid,
        version_name: &str,
    ) -> Result<Option<ImageVersion>, MetadataError> {
        let version = image_version::Entity::find()
            .filter(image_version::Column::ImageId.eq(image_id))
            .filter(image_version::Column::Name.eq(version_name))
            .one(&self.db)
            .await?;

        Ok(version.map(ImageVersion::from))
    }

    async fn create_image(&self, image: Image) -> Result<Image, MetadataError> {
        let model = image::ActiveModel {
            id: Set(image.id),
            owner_id: Set(image.owner_id),
            group: Set(image.group),
            name: Set(image.name),
            created_at: Set(image.created_at),
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn create_version(&self, version: ImageVersion) -> Result<ImageVersion, MetadataError> {
        let model = image_version::ActiveModel {
            id: Set(version.id),
            image_id: Set(version.image_id),
            name: Set(version.name),
            created_at: Set(version.created_at),
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn create_format(&self, format: ImageFormat) -> Result<ImageFormat, MetadataError> {
        let model = image_format::ActiveModel {
            id: Set(format.id),
            version_id: Set(format.version_id),
            format_type: Set(format.format_type),
            uri: Set(format.uri),
            content_hash: Set(format.content_hash),
            created_at: Set(format.created_at),
        };

        Ok(model.insert(&self.db).await?.into())
    }
}
