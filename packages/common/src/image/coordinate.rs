use std::fmt;

use super::format::FormatType;

/// Maximum length (in characters) of a single coordinate component.
pub const MAX_SEGMENT_LEN: usize = 128;

/// Which part of a coordinate failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Group,
    Name,
    Version,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Name => "name",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a coordinate component was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// Empty or whitespace-only.
    Empty,
    /// Longer than [`MAX_SEGMENT_LEN`].
    TooLong,
    /// Contains `/` or `\`.
    ContainsPathSeparator,
    /// Is `.` or `..`.
    PathTraversal,
    /// Starts with a dot.
    Hidden,
    /// Contains NUL or another ASCII control character.
    ControlCharacter,
}

impl SegmentError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "must not be empty",
            Self::TooLong => "must be at most 128 characters",
            Self::ContainsPathSeparator => "must not contain path separators",
            Self::PathTraversal => "must not be '.' or '..'",
            Self::Hidden => "must not start with '.'",
            Self::ControlCharacter => "must not contain control characters",
        }
    }
}

/// A coordinate component that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {component}: {}", reason.message())]
pub struct InvalidCoordinate {
    pub component: Component,
    pub reason: SegmentError,
}

/// Validates one coordinate component.
///
/// Components end up both as filesystem path segments and as URI segments.
pub fn validate_segment(segment: &str) -> Result<&str, SegmentError> {
    if segment.trim().is_empty() {
        return Err(SegmentError::Empty);
    }
    if segment.chars().count() > MAX_SEGMENT_LEN {
        return Err(SegmentError::TooLong);
    }
    if segment.chars().any(|c| c.is_ascii_control()) {
        return Err(SegmentError::ControlCharacter);
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(SegmentError::ContainsPathSeparator);
    }
    if segment == "." || segment == ".." {
        return Err(SegmentError::PathTraversal);
    }
    if segment.starts_with('.') {
        return Err(SegmentError::Hidden);
    }
    Ok(segment)
}

/// Identifies one uploadable artifact: `(group, name, version, format)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group: String,
    name: String,
    version: String,
    format: FormatType,
}

impl Coordinate {
    /// Build a validated coordinate.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        format: FormatType,
    ) -> Result<Self, InvalidCoordinate> {
        let group = group.into();
        let name = name.into();
        let version = version.into();

        for (component, value) in [
            (Component::Group, &group),
            (Component::Name, &name),
            (Component::Version, &version),
        ] {
            validate_segment(value).map_err(|reason| InvalidCoordinate { component, reason })?;
        }

        Ok(Self {
            group,
            name,
            version,
            format,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn format(&self) -> FormatType {
        self.format
    }

    /// Canonical resource identifier of the format at this coordinate.
    pub fn uri(&self) -> String {
        build_uri(&self.group, &self.name, &self.version, self.format)
    }

    /// Blob location relative to the storage root:
    /// `images/{group}/{name}/{version}/{name}-{version}.{extension}`.
    pub fn blob_key(&self) -> String {
        format!(
            "images/{group}/{name}/{version}/{name}-{version}.{ext}",
            group = self.group,
            name = self.name,
            version = self.version,
            ext = self.format.file_extension(),
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.group, self.name, self.version, self.format
        )
    }
}

/// Derive the canonical URI `/v1/{group}/{name}/{version}/{format}`.
pub fn build_uri(group: &str, name: &str, version: &str, format: FormatType) -> String {
    format!("/v1/{group}/{name}/{version}/{}", format.as_str())
}

/// Join the public base URL and a resource URI with exactly one slash.
pub fn absolute_location(base_url: &str, uri: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        uri.trim_start_matches('/')
    )
}
