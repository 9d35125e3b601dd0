pub mod image;
pub mod status;
