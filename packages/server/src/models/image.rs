use chrono::{DateTime, Utc};
use registry_common::{FormatType, ImageFormat};
use serde::Serialize;

/// Response DTO for a stored image format.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageFormatResponse {
    /// Format ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Owning version ID.
    pub version_id: String,
    pub format_type: FormatType,
    /// Canonical resource URI.
    #[schema(example = "/v1/u1/debian/9.0/qcow2")]
    pub uri: String,
    /// SHA-512 of the stored file, hex encoded.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<ImageFormat> for ImageFormatResponse {
    fn from(format: ImageFormat) -> Self {
        Self {
            id: format.id.to_string(),
            version_id: format.version_id.to_string(),
            format_type: format.format_type,
            uri: format.uri,
            content_hash: format.content_hash,
            created_at: format.created_at,
        }
    }
}
