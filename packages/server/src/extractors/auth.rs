use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Basic};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::hash;

/// User authenticated with HTTP Basic credentials.
///
/// Add this as a handler parameter to require authentication. The username
/// is also the group the user uploads into.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let realm = &state.config.auth.realm;

        let TypedHeader(Authorization(credentials)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::CredentialsMissing {
                            realm: realm.clone(),
                        }
                    } else {
                        AppError::InvalidCredentials {
                            realm: realm.clone(),
                        }
                    }
                })?;

        let invalid = || AppError::InvalidCredentials {
            realm: realm.clone(),
        };

        let user = user::Entity::find()
            .filter(user::Column::Username.eq(credentials.username()))
            .one(&state.db)
            .await?
            .ok_or_else(invalid)?;

        let is_valid = hash::verify_password(credentials.password(), &user.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
        if !is_valid {
            tracing::debug!(username = %user.username, "Rejected credentials");
            return Err(invalid());
        }

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}
