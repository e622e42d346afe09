#![allow(dead_code)]

use reqwest::{header, redirect, Client, StatusCode};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use yatube::forms::CleanedPost;
use yatube::models::{user, GroupModel, PostModel, User, UserModel};
use yatube::services::{auth::AuthService, group::GroupService, post::PostService};

static INIT: Once = Once::new();
static GROUP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        // Cheap hashes keep the suite fast
        std::env::set_var("BCRYPT_COST", "4");
        let config = yatube::config::jwt::JwtConfig::from_env().unwrap();
        let _ = yatube::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET a page, optionally as `user`, returning status and JSON body.
    pub async fn get_page(&self, path: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// POST an urlencoded form, returning the raw response.
    pub async fn post_form(
        &self,
        path: &str,
        user: Option<&TestUser>,
        form: &[(&str, &str)],
    ) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).form(form);
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.unwrap()
    }
}

/// Start the full router on a random port against a fresh SQLite file.
pub async fn spawn_app() -> TestApp {
    init_env();

    let db_path = std::env::temp_dir().join(format!("yatube_{}.db", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = yatube::config::database::connect(&database_url)
        .await
        .expect("Failed to open test database");

    yatube::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app = yatube::routes::create_routes()
        .layer(axum::middleware::from_fn(
            yatube::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
    }
}

/// Register a user directly through the service.
pub async fn create_test_user(app: &TestApp, username: &str) -> TestUser {
    let (user, token) = AuthService::new(app.db.clone())
        .register(username, &format!("{username}@test.com"), "test_password_123")
        .await
        .expect("Failed to register user");

    TestUser {
        id: user.id,
        username: user.username,
        token,
    }
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i32) -> UserModel {
    let existing = User::find_by_id(user_id).one(db).await.unwrap().unwrap();
    let mut active: user::ActiveModel = existing.into();
    active.role = sea_orm::ActiveValue::Set(user::ROLE_ADMIN.to_string());
    active.update(db).await.expect("Failed to make user admin")
}

pub async fn create_test_group(app: &TestApp) -> GroupModel {
    let counter = GROUP_COUNTER.fetch_add(1, Ordering::SeqCst);
    GroupService::new(app.db.clone())
        .create(
            &format!("Test group {counter}"),
            &format!("test-slug-{counter}"),
            "Test description",
        )
        .await
        .expect("Failed to create group")
}

pub async fn create_test_post(
    app: &TestApp,
    author: &TestUser,
    text: &str,
    group_id: Option<i32>,
) -> PostModel {
    PostService::new(app.db.clone())
        .create(
            author.id,
            &CleanedPost {
                text: text.to_string(),
                group_id,
            },
        )
        .await
        .expect("Failed to create post")
}

pub async fn post_count(app: &TestApp) -> u64 {
    PostService::new(app.db.clone()).count().await.unwrap()
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("Response has no Location header")
        .to_str()
        .unwrap()
        .to_string()
}
