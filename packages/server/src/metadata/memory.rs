use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use registry_common::{Coordinate, FormatType, Image, ImageFormat, ImageVersion};
use uuid::Uuid;

use super::error::MetadataError;
use super::traits::MetadataStore;

#[derive(Default)]
struct Tables {
    images: HashMap<(String, String), Image>,
    versions: HashMap<(Uuid, String), ImageVersion>,
    formats: HashMap<(Uuid, FormatType), ImageFormat>,
}

/// Process-local metadata store with the same unique keys as the database.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    tables: Mutex<Tables>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, MetadataError> {
        self.tables
            .lock()
            .map_err(|_| MetadataError::Backend("metadata tables poisoned".into()))
    }

    pub fn image_count(&self) -> usize {
        self.tables().map(|t| t.images.len()).unwrap_or_default()
    }

    pub fn version_count(&self) -> usize {
        self.tables().map(|t| t.versions.len()).unwrap_or_default()
    }

    pub fn format_count(&self) -> usize {
        self.tables().map(|t| t.formats.len()).unwrap_or_default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn find_format(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<ImageFormat>, MetadataError> {
        let tables = self.tables()?;
        let format = tables
            .images
            .get(&(coordinate.group().to_string(), coordinate.name().to_string()))
            .and_then(|image| {
                tables
                    .versions
                    .get(&(image.id, coordinate.version().to_string()))
            })
            .and_then(|version| tables.formats.get(&(version.id, coordinate.format())))
            .cloned();
        Ok(format)
    }

    async fn find_image(&self, group: &str, name: &str) -> Result<Option<Image>, MetadataError> {
        let tables = self.tables()?;
        Ok(tables
            .images
            .get(&(group.to_string(), name.to_string()))
            .cloned())
    }

    async fn find_version(
        &self,
        image_id: Uuid,
        version_name: &str,
    ) -> Result<Option<ImageVersion>, MetadataError> {
        let tables = self.tables()?;
        Ok(tables
            .versions
            .get(&(image_id, version_name.to_string()))
            .cloned())
    }

    async fn create_image(&self, image: Image) -> Result<Image, MetadataError> {
        let mut tables = self.tables()?;
        let key = (image.group.clone(), image.name.clone());
        if tables.images.contains_key(&key) {
            return Err(MetadataError::Conflict(format!(
                "image {}/{} already exists",
                image.group, image.name
            )));
        }
        tables.images.insert(key, image.clone());
        Ok(image)
    }

    async fn create_version(&self, version: ImageVersion) -> Result<ImageVersion, MetadataError> {
        let mut tables = self.tables()?;
        if !tables.images.values().any(|i| i.id == version.image_id) {
            return Err(MetadataError::Backend(format!(
                "image {} does not exist",
                version.image_id
            )));
        }
        let key = (version.image_id, version.name.clone());
        if tables.versions.contains_key(&key) {
            return Err(MetadataError::Conflict(format!(
                "version {} already exists",
                version.name
            )));
        }
        tables.versions.insert(key, version.clone());
        Ok(version)
    }

    async fn create_format(&self, format: ImageFormat) -> Result<ImageFormat, MetadataError> {
        let mut tables = self.tables()?;
        if !tables.versions.values().any(|v| v.id == format.version_id) {
            return Err(MetadataError::Backend(format!(
                "version {} does not exist",
                format.version_id
            )));
        }
        let key = (format.version_id, format.format_type);
        if tables.formats.contains_key(&key) || tables.formats.values().any(|f| f.uri == format.uri)
        {
            return Err(MetadataError::Conflict(format!(
                "format {} already exists",
                format.uri
            )));
        }
        tables.formats.insert(key, format.clone());
        Ok(format)
    }
}
