use axum::{extract::Extension, middleware, Router};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use yatube::{config, migration, routes, services, utils};

#[derive(OpenApi)]
#[openapi(
    paths(
        yatube::handlers::health::health_check,
        // Accounts
        yatube::handlers::auth::signup_form,
        yatube::handlers::auth::signup_submit,
        yatube::handlers::auth::login_form,
        yatube::handlers::auth::login_submit,
        yatube::handlers::auth::logout,
        // Posts
        yatube::handlers::post::index,
        yatube::handlers::post::group_posts,
        yatube::handlers::post::profile,
        yatube::handlers::post::post_detail,
        yatube::handlers::post::create_form,
        yatube::handlers::post::create_submit,
        yatube::handlers::post::edit_form,
        yatube::handlers::post::edit_submit,
        // Groups
        yatube::handlers::group::create_group,
        yatube::handlers::group::delete_group,
    ),
    components(
        schemas(
            yatube::response::ApiResponse<serde_json::Value>,
            yatube::response::PaginatedResponse<serde_json::Value>,
            yatube::response::PaginationQuery,
            yatube::error::AppError,
            yatube::forms::PostFormData,
            yatube::forms::FormView,
            yatube::handlers::auth::SignupForm,
            yatube::handlers::auth::LoginForm,
            yatube::handlers::post::AuthorResponse,
            yatube::handlers::post::GroupResponse,
            yatube::handlers::post::PostResponse,
            yatube::handlers::group::CreateGroupRequest,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "auth", description = "Signup, login and logout"),
        (name = "posts", description = "Feeds, post pages and the post form"),
        (name = "groups", description = "Group administration"),
        (name = "health", description = "Liveness probe"),
    )
)]
struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    utils::cookie::SESSION_COOKIE,
                ))),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Yatube v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_admin::ensure_bootstrap_admin(&db).await?;

    let app = create_app().layer(Extension(db));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // Checked here for an early error; the connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    routes::create_routes()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(
            yatube::middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
