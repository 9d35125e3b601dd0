#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Disk-image codec of an uploaded artifact.
///
/// The set is closed: an upload whose filename extension does not map to one
/// of these variants is rejected. When the `sea-orm` feature is enabled, this
/// enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// QEMU copy-on-write v2.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "qcow2"))]
    Qcow2,
}

impl FormatType {
    /// All supported format types.
    pub const ALL: &'static [FormatType] = &[Self::Qcow2];

    /// Lowercase token used in URIs and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qcow2 => "qcow2",
        }
    }

    /// File extension of blobs stored for this format.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Qcow2 => "qcow2",
        }
    }

    /// Look up the format for a bare file extension (no leading dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.file_extension() == extension)
    }

    /// Infer the format from an original upload filename.
    ///
    /// On failure the offending extension is returned (empty when the
    /// filename has none).
    pub fn from_filename(filename: &str) -> Result<Self, String> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| extension.to_string())
    }

    /// Extensions accepted for upload.
    pub fn supported_extensions() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.file_extension()).collect()
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
