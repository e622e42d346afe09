use crate::error::{AppError, AppResult};
use crate::pages::{Page, Template};
use crate::services::auth::AuthService;
use crate::utils::{
    cookie::{build_clear_cookie, build_session_cookie},
    jwt::session_expiry,
};
use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupForm {
    /// Username (3-150 characters)
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Where to go after logging in
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct AccountFormContext {
    pub username: String,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn redirect_with_session(target: &str, token: &str) -> Response {
    (
        [(header::SET_COOKIE, build_session_cookie(token, session_expiry()))],
        Redirect::to(target),
    )
        .into_response()
}

fn rejected(template: Template, context: AccountFormContext) -> Response {
    Page::new(template, context)
        .with_status(StatusCode::BAD_REQUEST)
        .into_response()
}

#[utoipa::path(
    get,
    path = "/auth/signup/",
    responses((status = 200, description = "Signup page (users/signup.html)", body = serde_json::Value)),
    tag = "auth"
)]
pub async fn signup_form() -> impl IntoResponse {
    Page::new(Template::Signup, AccountFormContext::default())
}

#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered and logged in"),
        (status = 400, description = "Signup page redisplayed with errors", body = serde_json::Value),
    ),
    tag = "auth"
)]
pub async fn signup_submit(
    Extension(db): Extension<DatabaseConnection>,
    Form(payload): Form<SignupForm>,
) -> AppResult<Response> {
    if let Err(e) = payload.validate() {
        return Ok(rejected(
            Template::Signup,
            AccountFormContext {
                username: payload.username,
                errors: vec![format!("Validation error: {e}")],
                next: None,
            },
        ));
    }

    let service = AuthService::new(db);
    match service
        .register(&payload.username, &payload.email, &payload.password)
        .await
    {
        Ok((_user, token)) => Ok(redirect_with_session("/", &token)),
        Err(AppError::Validation(msg)) => Ok(rejected(
            Template::Signup,
            AccountFormContext {
                username: payload.username,
                errors: vec![msg],
                next: None,
            },
        )),
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/auth/login/",
    params(("next" = Option<String>, Query, description = "Path to return to")),
    responses((status = 200, description = "Login page (users/login.html)", body = serde_json::Value)),
    tag = "auth"
)]
pub async fn login_form(Query(query): Query<NextQuery>) -> impl IntoResponse {
    Page::new(
        Template::Login,
        AccountFormContext {
            next: query.next,
            ..Default::default()
        },
    )
}

#[utoipa::path(
    post,
    path = "/auth/login/",
    params(("next" = Option<String>, Query, description = "Path to return to")),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in; redirects to next"),
        (status = 400, description = "Login page redisplayed with errors", body = serde_json::Value),
    ),
    tag = "auth"
)]
pub async fn login_submit(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<NextQuery>,
    Form(payload): Form<LoginForm>,
) -> AppResult<Response> {
    let next = payload.next.or(query.next);

    let service = AuthService::new(db);
    match service.login(&payload.username, &payload.password).await {
        Ok((user, token)) => {
            tracing::info!(user_id = user.id, "User logged in");
            Ok(redirect_with_session(safe_next(next.as_deref()), &token))
        }
        Err(AppError::Validation(msg)) => Ok(rejected(
            Template::Login,
            AccountFormContext {
                username: payload.username,
                errors: vec![msg],
                next,
            },
        )),
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout/",
    responses((status = 303, description = "Session cleared; redirects home")),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, build_clear_cookie())],
        Redirect::to("/"),
    )
}
