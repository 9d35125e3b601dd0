pub mod image;
pub mod image_format;
pub mod image_version;
pub mod user;
