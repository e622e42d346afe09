use crate::{
    error::{AppError, AppResult},
    models::{User, UserModel},
    utils::{
        cookie::{extract_cookie, SESSION_COOKIE},
        jwt::decode_session_token,
    },
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// The logged-in user of the current request.
///
/// Extracting `AuthUser` directly makes a handler login-only: anonymous
/// requests are sent to the login page with the current path as `next`.
/// Extract `Option<AuthUser>` where anonymous access is fine.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl From<UserModel> for AuthUser {
    fn from(user: UserModel) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin(),
            username: user.username,
        }
    }
}

/// Session middleware
///
/// Reads the session token from the Authorization header or the session
/// cookie and, when it names an existing user, stores an [`AuthUser`] in the
/// request extensions. Missing, expired or forged tokens leave the request
/// anonymous.
pub async fn session_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(&headers).or_else(|| extract_cookie(&headers, SESSION_COOKIE));

    if let Some(token) = token {
        match resolve_session(&db, &token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to resolve session: {e}"),
        }
    }

    next.run(request).await
}

async fn resolve_session(db: &DatabaseConnection, token: &str) -> AppResult<Option<AuthUser>> {
    let claims = match decode_session_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring invalid session token: {e}");
            return Ok(None);
        }
    };

    let Ok(user_id) = claims.sub.parse::<i32>() else {
        return Ok(None);
    };

    let user = User::find_by_id(user_id).one(db).await?;
    Ok(user.map(AuthUser::from))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verify the current user has the admin role
pub fn require_admin(auth_user: &AuthUser) -> AppResult<()> {
    if !auth_user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::LoginRequired {
                next: parts.uri.path().to_string(),
            })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn require_admin_checks_role() {
        let mut user = AuthUser {
            user_id: 1,
            username: "author".to_string(),
            is_admin: false,
        };
        assert!(matches!(require_admin(&user), Err(AppError::Forbidden)));
        user.is_admin = true;
        assert!(require_admin(&user).is_ok());
    }
}
