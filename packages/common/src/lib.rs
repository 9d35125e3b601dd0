pub mod config;
pub mod image;
pub mod storage;

pub use image::{Coordinate, FormatType, Image, ImageFormat, ImageVersion};
