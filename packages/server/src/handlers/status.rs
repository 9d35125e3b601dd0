use axum::Json;
use tracing::instrument;

use crate::models::status::StatusResponse;

#[utoipa::path(
    get,
    path = "/status",
    tag = "Status",
    operation_id = "getStatus",
    summary = "Service version",
    responses(
        (status = 200, description = "Running service version", body = StatusResponse),
    ),
)]
#[instrument]
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: option_env!("REGISTRY_BUILD").unwrap_or("unknown").to_string(),
    })
}
