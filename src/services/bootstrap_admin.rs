use crate::error::{AppError, AppResult};
use crate::models::{user, User};
use crate::utils::{
    hash_password,
    validation::{is_valid_username, INVALID_USERNAME_MESSAGE},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !crate::config::parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// Make sure someone can create groups on a fresh install.
///
/// Does nothing when an admin already exists. Otherwise promotes the
/// configured user, creating it first if needed.
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    if !is_valid_username(&cfg.username) {
        return Err(AppError::Validation(format!(
            "BOOTSTRAP_ADMIN_USERNAME: {INVALID_USERNAME_MESSAGE}"
        )));
    }

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(user::ROLE_ADMIN))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let now = chrono::Utc::now().naive_utc();

    let existing = User::find()
        .filter(user::Column::Username.eq(cfg.username.clone()))
        .one(db)
        .await?;

    if let Some(existing) = existing {
        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(user::ROLE_ADMIN.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(db).await?;
        tracing::info!(username = %cfg.username, "Promoted bootstrap admin");
        return Ok(());
    }

    let new_user = user::ActiveModel {
        username: sea_orm::ActiveValue::Set(cfg.username.clone()),
        email: sea_orm::ActiveValue::Set(cfg.email),
        password_hash: sea_orm::ActiveValue::Set(hash_password(&cfg.password)?),
        role: sea_orm::ActiveValue::Set(user::ROLE_ADMIN.to_string()),
        created_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };
    new_user.insert(db).await?;
    tracing::info!(username = %cfg.username, "Created bootstrap admin");
    Ok(())
}
