use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::coordinate::Coordinate;
use super::format::FormatType;
use crate::storage::ContentHash;

/// A named image inside a group. Unique on `(group, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    /// Fixed at creation.
    pub owner_id: Uuid,
    pub group: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn new(owner_id: Uuid, group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            group: group.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A version of an image. Unique on `(image_id, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVersion {
    pub id: Uuid,
    pub image_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ImageVersion {
    pub fn new(image_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            image_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// One stored artifact of a version. Unique on `(version_id, format_type)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub id: Uuid,
    pub version_id: Uuid,
    pub format_type: FormatType,
    /// Always equal to `build_uri` over the format's coordinate.
    pub uri: String,
    /// SHA-512 of the stored blob, hex encoded.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl ImageFormat {
    pub fn new(version_id: Uuid, coordinate: &Coordinate, content_hash: &ContentHash) -> Self {
        Self {
            id: Uuid::now_v7(),
            version_id,
            format_type: coordinate.format(),
            uri: coordinate.uri(),
            content_hash: content_hash.to_hex(),
            created_at: Utc::now(),
        }
    }
}
