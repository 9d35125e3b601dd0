use registry_common::ImageVersion;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_version")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique_key = "image_version_name")]
    pub image_id: Uuid,
    #[sea_orm(belongs_to, from = "image_id", to = "id")]
    pub image: HasOne<super::image::Entity>,

    #[sea_orm(unique_key = "image_version_name")]
    pub name: String,

    #[sea_orm(has_many)]
    pub formats: HasMany<super::image_format::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImageVersion {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            image_id: model.image_id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
