use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for stored images. Default: "./data".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Largest accepted image in bytes. Default: 16 GiB.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    /// Age after which an unreleased write lease is considered abandoned.
    /// Default: one hour.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_image_size() -> u64 {
    16 * 1024 * 1024 * 1024
}
fn default_lease_ttl_secs() -> u64 {
    60 * 60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_image_size: default_max_image_size(),
            lease_ttl_secs: default_lease_ttl_secs(),
        }
    }
}
