use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use registry_common::FormatType;
use registry_common::image::absolute_location;
use registry_common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::ingest::IngestError;

/// Content type the upload's `file` part must declare.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `MISSING_PARAMETER`, `INVALID_REQUEST_CONTENT_TYPE`,
    /// `INVALID_FILE_CONTENT_TYPE`, `INVALID_FILE_FORMAT`,
    /// `CREDENTIALS_MISSING`, `INVALID_CREDENTIALS`,
    /// `IMAGE_FORMAT_ALREADY_EXISTS`, `UPLOAD_IN_PROGRESS`, `IMAGE_TOO_LARGE`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "IMAGE_FORMAT_ALREADY_EXISTS")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Image format already exists at /v1/u1/debian/9.0/qcow2")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ErrorBody {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Machine-readable context for a rejected request.
#[derive(Default, Serialize, utoipa::ToSchema)]
pub struct ErrorDetails {
    /// Name of the missing request parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "file")]
    pub parameter: Option<String>,
    /// Accepted file extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_file_formats: Option<Vec<&'static str>>,
    /// Accepted content types for the file part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_content_types: Option<Vec<&'static str>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    MissingParameter(String),
    InvalidRequestContentType,
    InvalidFileContentType(String),
    InvalidFileFormat(String),
    /// Basic credentials absent. Carries the realm for the challenge.
    CredentialsMissing {
        realm: String,
    },
    InvalidCredentials {
        realm: String,
    },
    /// The coordinate already has a format. `location` is the absolute URL.
    AlreadyExists {
        message: String,
        location: String,
    },
    UploadInProgress {
        message: String,
        location: String,
    },
    TooLarge {
        limit: u64,
    },
    Internal(String),
}

impl AppError {
    /// Translate an ingestion failure, resolving resource URIs against `base_url`.
    pub fn from_ingest(err: IngestError, base_url: &str) -> Self {
        match err {
            IngestError::UnsupportedFormat { .. } => AppError::InvalidFileFormat(err.to_string()),
            IngestError::InvalidCoordinate(e) => AppError::Validation(e.to_string()),
            IngestError::DuplicateFormat { ref existing } => AppError::AlreadyExists {
                location: absolute_location(base_url, &existing.uri),
                message: err.to_string(),
            },
            IngestError::UploadInProgress { ref uri } => AppError::UploadInProgress {
                location: absolute_location(base_url, uri),
                message: err.to_string(),
            },
            IngestError::Storage(StorageError::SizeLimitExceeded { limit, .. }) => {
                AppError::TooLarge { limit }
            }
            IngestError::Storage(_) | IngestError::Metadata(_) | IngestError::TaskFailed(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "MISSING_PARAMETER",
                    format!("Missing required parameter '{name}'"),
                )
                .with_details(ErrorDetails {
                    parameter: Some(name),
                    ..Default::default()
                }),
            ),
            AppError::InvalidRequestContentType => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "INVALID_REQUEST_CONTENT_TYPE",
                    "Request content type must be multipart/form-data",
                ),
            ),
            AppError::InvalidFileContentType(actual) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "INVALID_FILE_CONTENT_TYPE",
                    format!("File content type must be {FILE_CONTENT_TYPE}, got '{actual}'"),
                )
                .with_details(ErrorDetails {
                    allowed_content_types: Some(vec![FILE_CONTENT_TYPE]),
                    ..Default::default()
                }),
            ),
            AppError::InvalidFileFormat(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("INVALID_FILE_FORMAT", msg).with_details(ErrorDetails {
                    allowed_file_formats: Some(FormatType::supported_extensions()),
                    ..Default::default()
                }),
            ),
            AppError::CredentialsMissing { .. } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("CREDENTIALS_MISSING", "Authentication required"),
            ),
            AppError::InvalidCredentials { .. } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AppError::AlreadyExists { message, .. } => (
                StatusCode::CONFLICT,
                ErrorBody::new("IMAGE_FORMAT_ALREADY_EXISTS", message),
            ),
            AppError::UploadInProgress { message, .. } => (
                StatusCode::CONFLICT,
                ErrorBody::new("UPLOAD_IN_PROGRESS", message),
            ),
            AppError::TooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody::new(
                    "IMAGE_TOO_LARGE",
                    format!("Image exceeds the maximum size of {limit} bytes"),
                ),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let extra = match &self {
            AppError::CredentialsMissing { realm } | AppError::InvalidCredentials { realm } => {
                Some((header::WWW_AUTHENTICATE, format!("Basic realm=\"{realm}\"")))
            }
            AppError::AlreadyExists { location, .. } | AppError::UploadInProgress { location, .. } => {
                Some((header::LOCATION, location.clone()))
            }
            _ => None,
        };

        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();

        if let Some((name, value)) = extra {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    response.headers_mut().insert(name, value);
                }
                Err(e) => tracing::warn!("Dropping invalid {} header: {}", name, e),
            }
        }

        response
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}
