use crate::error::{AppError, AppResult};
use crate::forms::{FormView, PostForm, PostFormData};
use crate::middleware::auth::AuthUser;
use crate::models::{GroupModel, UserModel};
use crate::pages::{Page, Template};
use crate::response::{PaginatedResponse, PaginationQuery, POSTS_PER_PAGE};
use crate::services::group::GroupService;
use crate::services::post::{Feed, PostService, PostWithRelations};
use crate::services::user::UserService;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorResponse {
    /// User ID
    pub id: i32,
    /// Username
    pub username: String,
}

impl From<UserModel> for AuthorResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    /// Group ID
    pub id: i32,
    /// Group title
    pub title: String,
    /// URL slug
    pub slug: String,
    /// Group description
    pub description: String,
}

impl From<GroupModel> for GroupResponse {
    fn from(g: GroupModel) -> Self {
        Self {
            id: g.id,
            title: g.title,
            slug: g.slug,
            description: g.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    /// Post ID
    pub id: i32,
    /// Post body
    pub text: String,
    /// Publication timestamp
    pub pub_date: String,
    pub author: AuthorResponse,
    pub group: Option<GroupResponse>,
}

impl From<PostWithRelations> for PostResponse {
    fn from(p: PostWithRelations) -> Self {
        Self {
            id: p.post.id,
            text: p.post.text,
            pub_date: p.post.pub_date.to_string(),
            author: p.author.into(),
            group: p.group.map(GroupResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: PaginatedResponse<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct GroupListContext {
    pub group: GroupResponse,
    pub page_obj: PaginatedResponse<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: AuthorResponse,
    pub posts_count: u64,
    pub page_obj: PaginatedResponse<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostResponse,
    pub author_posts_count: u64,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: FormView,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i32>,
}

/// Post ids only match digits; anything else is an unknown page.
fn parse_post_id(raw: &str) -> AppResult<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound);
    }
    raw.parse().map_err(|_| AppError::NotFound)
}

fn post_detail_path(id: i32) -> String {
    format!("/posts/{id}/")
}

fn profile_path(username: &str) -> String {
    format!("/profile/{username}/")
}

fn form_page(form: &PostForm, is_edit: bool, post_id: Option<i32>) -> Page<PostFormContext> {
    Page::new(
        Template::CreatePost,
        PostFormContext {
            form: form.view(),
            is_edit,
            post_id,
        },
    )
}

#[utoipa::path(
    get,
    path = "/",
    params(("page" = Option<String>, Query, description = "Page number")),
    responses(
        (status = 200, description = "Global feed (posts/index.html)", body = serde_json::Value),
    ),
    tag = "posts"
)]
pub async fn index(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let page_obj = service
        .feed(Feed::All, params.requested_page(), POSTS_PER_PAGE)
        .await?
        .map(PostResponse::from);

    Ok(Page::new(Template::Index, IndexContext { page_obj }))
}

#[utoipa::path(
    get,
    path = "/group/{slug}/",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("page" = Option<String>, Query, description = "Page number"),
    ),
    responses(
        (status = 200, description = "Group feed (posts/group_list.html)", body = serde_json::Value),
        (status = 404, description = "Group not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn group_posts(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let group = GroupService::new(db.clone()).get_by_slug(&slug).await?;

    let page_obj = PostService::new(db)
        .feed(Feed::Group(group.id), params.requested_page(), POSTS_PER_PAGE)
        .await?
        .map(PostResponse::from);

    Ok(Page::new(
        Template::GroupList,
        GroupListContext {
            group: group.into(),
            page_obj,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/profile/{username}/",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<String>, Query, description = "Page number"),
    ),
    responses(
        (status = 200, description = "Author feed (posts/profile.html)", body = serde_json::Value),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(username): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let author = UserService::new(db.clone())
        .get_by_username(&username)
        .await?;

    let page_obj = PostService::new(db)
        .feed(Feed::Author(author.id), params.requested_page(), POSTS_PER_PAGE)
        .await?
        .map(PostResponse::from);

    Ok(Page::new(
        Template::Profile,
        ProfileContext {
            author: author.into(),
            posts_count: page_obj.total,
            page_obj,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details (posts/post_detail.html)", body = serde_json::Value),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn post_detail(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post_id = parse_post_id(&post_id)?;

    let service = PostService::new(db);
    let post = service.get_detail(post_id).await?;
    let author_posts_count = service.count_by_author(post.author.id).await?;

    Ok(Page::new(
        Template::PostDetail,
        PostDetailContext {
            post: post.into(),
            author_posts_count,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/create/",
    responses(
        (status = 200, description = "Empty post form (posts/create_post.html)", body = serde_json::Value),
        (status = 303, description = "Login required"),
    ),
    tag = "posts"
)]
pub async fn create_form(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let groups = GroupService::new(db).list().await?;
    Ok(form_page(&PostForm::blank(groups), false, None))
}

#[utoipa::path(
    post,
    path = "/create/",
    request_body(content = PostFormData, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirects to the author's profile"),
        (status = 400, description = "Form redisplayed with errors", body = serde_json::Value),
    ),
    tag = "posts"
)]
pub async fn create_submit(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Form(data): Form<PostFormData>,
) -> AppResult<Response> {
    let groups = GroupService::new(db.clone()).list().await?;
    let mut form = PostForm::bind(data, groups);

    let Some(cleaned) = form.clean() else {
        tracing::debug!(errors = ?form.errors(), "Rejected post form");
        return Ok(form_page(&form, false, None)
            .with_status(StatusCode::BAD_REQUEST)
            .into_response());
    };

    match PostService::new(db).create(auth_user.user_id, &cleaned).await {
        Ok(_) => Ok(Redirect::to(&profile_path(&auth_user.username)).into_response()),
        Err(AppError::Validation(message)) => {
            form.add_error("group", message);
            Ok(form_page(&form, false, None)
                .with_status(StatusCode::BAD_REQUEST)
                .into_response())
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Pre-filled post form (posts/create_post.html)", body = serde_json::Value),
        (status = 303, description = "Login required, or not the author"),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn edit_form(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = PostService::new(db.clone()).get_by_id(post_id).await?;

    if post.author_id != auth_user.user_id {
        return Ok(Redirect::to(&post_detail_path(post_id)).into_response());
    }

    let groups = GroupService::new(db).list().await?;
    Ok(form_page(&PostForm::for_post(&post, groups), true, Some(post_id)).into_response())
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body(content = PostFormData, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Saved (or not the author); redirects to the post"),
        (status = 400, description = "Form redisplayed with errors", body = serde_json::Value),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn edit_submit(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<String>,
    Form(data): Form<PostFormData>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    let service = PostService::new(db.clone());
    let post = service.get_by_id(post_id).await?;

    if post.author_id != auth_user.user_id {
        tracing::warn!(
            post_id,
            user_id = auth_user.user_id,
            "Refused edit by non-author"
        );
        return Ok(Redirect::to(&post_detail_path(post_id)).into_response());
    }

    let groups = GroupService::new(db).list().await?;
    let mut form = PostForm::bind(data, groups);

    let Some(cleaned) = form.clean() else {
        return Ok(form_page(&form, true, Some(post_id))
            .with_status(StatusCode::BAD_REQUEST)
            .into_response());
    };

    match service.update(post_id, auth_user.user_id, &cleaned).await {
        Ok(_) => Ok(Redirect::to(&post_detail_path(post_id)).into_response()),
        Err(AppError::Validation(message)) => {
            form.add_error("group", message);
            Ok(form_page(&form, true, Some(post_id))
                .with_status(StatusCode::BAD_REQUEST)
                .into_response())
        }
        Err(e) => Err(e),
    }
}
