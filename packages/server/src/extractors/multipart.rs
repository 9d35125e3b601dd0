use axum::extract::{FromRequest, Multipart, Request, multipart::MultipartRejection};

use crate::error::AppError;

/// A `Multipart` wrapper that rejects non-multipart requests with
/// `AppError::InvalidRequestContentType`.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| match e {
                MultipartRejection::InvalidBoundary(_) => AppError::InvalidRequestContentType,
                other => AppError::Validation(other.body_text()),
            })?;
        Ok(AppMultipart(multipart))
    }
}
