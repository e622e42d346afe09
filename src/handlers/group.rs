use crate::error::{AppError, AppResult};
use crate::handlers::post::GroupResponse;
use crate::middleware::auth::{require_admin, AuthUser};
use crate::response::ApiResponse;
use crate::services::group::GroupService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    /// Group title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// URL slug: letters, digits, hyphens and underscores (1-50 characters)
    #[validate(length(min = 1, max = 50))]
    pub slug: String,
    /// Group description
    pub description: String,
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[utoipa::path(
    post,
    path = "/admin/groups/",
    security(("session" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = GroupResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Slug already taken", body = AppError),
    ),
    tag = "groups"
)]
pub async fn create_group(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if !is_valid_slug(&payload.slug) {
        return Err(AppError::Validation(
            "Slug may only contain letters, digits, hyphens and underscores".to_string(),
        ));
    }

    let service = GroupService::new(db);
    let group = service
        .create(&payload.title, &payload.slug, &payload.description)
        .await?;

    Ok(ApiResponse::ok(GroupResponse::from(group)))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{slug}/",
    security(("session" = [])),
    params(("slug" = String, Path, description = "Group slug")),
    responses(
        (status = 200, description = "Group deleted, its posts kept without a group", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Group not found", body = AppError),
    ),
    tag = "groups"
)]
pub async fn delete_group(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    GroupService::new(db).delete(&slug).await?;

    Ok(ApiResponse::with_message(slug, "Group deleted".to_string()))
}
