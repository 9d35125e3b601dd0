use chrono::Utc;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::entity::user;
use crate::utils::hash;

/// Make sure a user with the given credentials exists.
///
/// An existing user keeps its stored password.
pub async fn ensure_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model, DbErr> {
    let password =
        hash::hash_password(password).map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    let model = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        username: Set(username.to_string()),
        password: Set(password),
        created_at: Set(Utc::now()),
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!("Created user '{}'", username),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user '{username}'")))
}
