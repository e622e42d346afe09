use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    utils::{
        encode_session_token, hash_password,
        validation::{is_valid_username, INVALID_USERNAME_MESSAGE},
        verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new user.
    /// Returns the user and a fresh session token.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<(UserModel, String)> {
        if !is_valid_username(username) {
            return Err(AppError::Validation(INVALID_USERNAME_MESSAGE.to_string()));
        }

        if self.user_exists(username, email).await? {
            return Err(AppError::Validation(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(user::ROLE_USER.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let token = encode_session_token(user.id)?;
        tracing::info!(user_id = user.id, username, "User registered");

        Ok((user, token))
    }

    /// Check credentials. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        let token = encode_session_token(user.id)?;
        Ok((user, token))
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

fn invalid_credentials() -> AppError {
    AppError::Validation("Please enter a correct username and password.".to_string())
}
