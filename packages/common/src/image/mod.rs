mod coordinate;
mod format;
mod record;

pub use coordinate::{
    Component, Coordinate, InvalidCoordinate, MAX_SEGMENT_LEN, SegmentError, absolute_location,
    build_uri, validate_segment,
};
pub use format::FormatType;
pub use record::{Image, ImageFormat, ImageVersion};
