use serde::Serialize;

/// Version information of the running service.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Build identifier, `"unknown"` unless set at compile time.
    #[schema(example = "a1b2c3d")]
    pub build: String,
}
