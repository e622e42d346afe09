use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// The fixed set of page templates the site renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Template {
    #[serde(rename = "posts/index.html")]
    Index,
    #[serde(rename = "posts/group_list.html")]
    GroupList,
    #[serde(rename = "posts/profile.html")]
    Profile,
    #[serde(rename = "posts/post_detail.html")]
    PostDetail,
    #[serde(rename = "posts/create_post.html")]
    CreatePost,
    #[serde(rename = "users/signup.html")]
    Signup,
    #[serde(rename = "users/login.html")]
    Login,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Template::Index => "posts/index.html",
            Template::GroupList => "posts/group_list.html",
            Template::Profile => "posts/profile.html",
            Template::PostDetail => "posts/post_detail.html",
            Template::CreatePost => "posts/create_post.html",
            Template::Signup => "users/signup.html",
            Template::Login => "users/login.html",
        }
    }
}

/// A rendered page: the template name plus the context handed to it.
#[derive(Debug, Serialize)]
pub struct Page<C: Serialize> {
    pub template: Template,
    pub context: C,
    #[serde(skip)]
    status: StatusCode,
}

impl<C: Serialize> Page<C> {
    pub fn new(template: Template, context: C) -> Self {
        Self {
            template,
            context,
            status: StatusCode::OK,
        }
    }

    /// Same page, answered with a non-200 status (a form redisplayed with
    /// errors, for instance).
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<C: Serialize> IntoResponse for Page<C> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_serializes_to_its_name() {
        for template in [
            Template::Index,
            Template::GroupList,
            Template::Profile,
            Template::PostDetail,
            Template::CreatePost,
            Template::Signup,
            Template::Login,
        ] {
            let value = serde_json::to_value(template).unwrap();
            assert_eq!(value, template.name());
        }
    }

    #[test]
    fn page_envelope_shape() {
        let page = Page::new(Template::Index, serde_json::json!({"answer": 42}));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["template"], "posts/index.html");
        assert_eq!(value["context"]["answer"], 42);
        assert!(value.get("status").is_none());
    }
}
