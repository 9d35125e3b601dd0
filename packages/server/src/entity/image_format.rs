use registry_common::{FormatType, ImageFormat};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_format")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique_key = "image_format_type")]
    pub version_id: Uuid,
    #[sea_orm(belongs_to, from = "version_id", to = "id")]
    pub version: HasOne<super::image_version::Entity>,

    #[sea_orm(unique_key = "image_format_type")]
    pub format_type: FormatType,

    /// `/v1/{group}/{name}/{version}/{format}`, immutable.
    #[sea_orm(unique)]
    pub uri: String,

    /// SHA-512 of the stored blob.
    pub content_hash: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImageFormat {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            version_id: model.version_id,
            format_type: model.format_type,
            uri: model.uri,
            content_hash: model.content_hash,
            created_at: model.created_at,
        }
    }
}
