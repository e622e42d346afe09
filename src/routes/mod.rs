use crate::config::rate_limit::{RateLimitConfig, RateLimitRule, RouteGroup};
use crate::handlers;
use crate::middleware::auth::session_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// Every page and endpoint of the site. Expects an
/// `Extension<DatabaseConnection>` layered on top.
pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    account_routes(&rate_limit_config)
        .merge(browse_routes(&rate_limit_config))
        .merge(write_routes(&rate_limit_config))
        .route("/health", routing::get(handlers::health::health_check))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(session_middleware))
}

/// Signup, login, logout.
fn account_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/auth/signup/",
            routing::get(handlers::auth::signup_form).post(handlers::auth::signup_submit),
        )
        .route(
            "/auth/login/",
            routing::get(handlers::auth::login_form).post(handlers::auth::login_submit),
        )
        .route("/auth/logout/", routing::post(handlers::auth::logout));

    with_optional_rate_limit(router, config, RouteGroup::Accounts)
}

/// Feeds and post pages, open to everyone.
fn browse_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/", routing::get(handlers::post::index))
        .route("/group/{slug}/", routing::get(handlers::post::group_posts))
        .route("/profile/{username}/", routing::get(handlers::post::profile))
        .route("/posts/{post_id}/", routing::get(handlers::post::post_detail));

    with_optional_rate_limit(router, config, RouteGroup::Browse)
}

/// Login-only pages and admin endpoints.
fn write_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/create/",
            routing::get(handlers::post::create_form).post(handlers::post::create_submit),
        )
        .route(
            "/posts/{post_id}/edit/",
            routing::get(handlers::post::edit_form).post(handlers::post::edit_submit),
        )
        // Admin only, checked in handler
        .route("/admin/groups/", routing::post(handlers::group::create_group))
        .route(
            "/admin/groups/{slug}/",
            routing::delete(handlers::group::delete_group),
        );

    with_optional_rate_limit(router, config, RouteGroup::Write)
}

fn with_optional_rate_limit(router: Router, config: &RateLimitConfig, group: RouteGroup) -> Router {
    if !config.enabled {
        return router;
    }

    let RateLimitRule {
        per_second,
        burst_size,
    } = config.rule(group);

    match GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?group, "Invalid rate limit rule, leaving routes unlimited");
            router
        }
    }
}
