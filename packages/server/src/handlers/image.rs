use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use registry_common::image::absolute_location;
use tracing::instrument;

use crate::error::{AppError, ErrorBody, FILE_CONTENT_TYPE};
use crate::extractors::auth::AuthUser;
use crate::extractors::multipart::AppMultipart;
use crate::ingest::{IngestError, IngestErrorKind, IngestRequest};
use crate::models::image::ImageFormatResponse;
use crate::state::AppState;
use crate::utils::spool::{SpooledFile, spool_field};

/// Multipart framing allowance on top of the image size limit.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Map an ingestion failure to a response, logging client-caused rejections.
fn reject(err: IngestError, base_url: &str) -> AppError {
    let kind = err.kind();
    if kind != IngestErrorKind::Storage {
        tracing::info!(?kind, error = %err, "Upload rejected");
    }
    AppError::from_ingest(err, base_url)
}

pub fn image_upload_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    let limit = max_image_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/{name}/{version}",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image file",
    description = "Stores an image file under the caller's group. The multipart part `file` is \
        required, must be `application/octet-stream`, and its filename extension selects the \
        format. Each `(group, name, version, format)` can be uploaded once.",
    params(
        ("name" = String, Path, description = "Image name"),
        ("version" = String, Path, description = "Image version"),
    ),
    request_body(content_type = "multipart/form-data", description = "Image file in the `file` part"),
    responses(
        (status = 201, description = "Image format created", body = ImageFormatResponse,
            headers(("Location" = String, description = "Absolute URL of the new resource"))),
        (status = 400, description = "Bad request (INVALID_REQUEST_CONTENT_TYPE, MISSING_PARAMETER, \
            INVALID_FILE_CONTENT_TYPE, INVALID_FILE_FORMAT, VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 409, description = "Conflict (IMAGE_FORMAT_ALREADY_EXISTS, UPLOAD_IN_PROGRESS)", body = ErrorBody,
            headers(("Location" = String, description = "Absolute URL of the conflicting resource"))),
        (status = 413, description = "Image too large (IMAGE_TOO_LARGE)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(group = %auth_user.username))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, AppError> {
    let base_url = &state.config.registry.base_url;
    let mut upload: Option<(String, SpooledFile)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let content_type = field.content_type().unwrap_or_default();
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if !essence.eq_ignore_ascii_case(FILE_CONTENT_TYPE) {
            return Err(AppError::InvalidFileContentType(content_type.to_string()));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        // Reject before reading the body.
        state
            .resolver
            .check_duplicate(&auth_user.username, &name, &version, &filename)
            .await
            .map_err(|e| reject(e, base_url))?;

        let spooled = spool_field(
            field,
            &state.config.storage.root.join(".tmp"),
            state.config.storage.max_image_size,
        )
        .await?;
        tracing::debug!(%filename, size = spooled.size(), "Upload spooled");
        upload = Some((filename, spooled));
        break;
    }

    let (original_filename, spooled) =
        upload.ok_or_else(|| AppError::MissingParameter("file".into()))?;

    let request = IngestRequest {
        owner_id: auth_user.user_id,
        group: auth_user.username,
        name,
        version,
        original_filename,
        content: spooled.open().await?,
    };

    let format = state
        .resolver
        .ingest(request)
        .await
        .map_err(|e| reject(e, base_url))?;

    let location = absolute_location(base_url, &format.uri);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ImageFormatResponse::from(format)),
    ))
}
