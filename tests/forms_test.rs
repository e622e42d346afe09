mod common;

use reqwest::StatusCode;
use sea_orm::{EntityTrait, QueryOrder};
use yatube::models::{post, Post, PostModel};

async fn latest_post(app: &common::TestApp) -> PostModel {
    Post::find()
        .order_by_desc(post::Column::Id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap()
}

async fn reload(app: &common::TestApp, id: i32) -> PostModel {
    Post::find_by_id(id).one(&app.db).await.unwrap().unwrap()
}

#[tokio::test]
async fn valid_form_creates_post() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let group = common::create_test_group(&app).await;
    let before = common::post_count(&app).await;

    let group_id = group.id.to_string();
    let resp = app
        .post_form(
            "/create/",
            Some(&author),
            &[("text", "Brand new post"), ("group", group_id.as_str())],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        common::location(&resp),
        format!("/profile/{}/", author.username)
    );

    assert_eq!(common::post_count(&app).await, before + 1);
    let created = latest_post(&app).await;
    assert_eq!(created.text, "Brand new post");
    assert_eq!(created.group_id, Some(group.id));
    assert_eq!(created.author_id, author.id);
}

#[tokio::test]
async fn create_redirects_to_a_working_profile() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "al.ice+1@x-y_z").await;

    let resp = app
        .post_form("/create/", Some(&author), &[("text", "Symbols in my name")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = common::location(&resp);
    assert_eq!(target, "/profile/al.ice+1@x-y_z/");

    let (status, body) = app.get_page(&target, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["author"]["username"], author.username);
    assert_eq!(
        body["context"]["page_obj"]["items"][0]["text"],
        "Symbols in my name"
    );
}

#[tokio::test]
async fn post_without_group_is_allowed() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;

    let resp = app
        .post_form("/create/", Some(&author), &[("text", "No group"), ("group", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(latest_post(&app).await.group_id, None);
}

#[tokio::test]
async fn blank_text_redisplays_form() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let before = common::post_count(&app).await;

    let resp = app
        .post_form("/create/", Some(&author), &[("text", "   ")])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["form"]["is_valid"], false);
    assert_eq!(
        body["context"]["form"]["fields"]["text"]["errors"][0],
        "This field is required."
    );
    assert_eq!(common::post_count(&app).await, before);
}

#[tokio::test]
async fn unknown_group_is_rejected() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let before = common::post_count(&app).await;

    let resp = app
        .post_form(
            "/create/",
            Some(&author),
            &[("text", "Some text"), ("group", "9999")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body["context"]["form"]["fields"]["group"]["errors"][0],
        "Select a valid choice."
    );
    assert_eq!(common::post_count(&app).await, before);
}

#[tokio::test]
async fn anonymous_create_changes_nothing() {
    let app = common::spawn_app().await;
    let before = common::post_count(&app).await;

    let resp = app
        .post_form("/create/", None, &[("text", "Anonymous")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/auth/login/?next=/create/");
    assert_eq!(common::post_count(&app).await, before);
}

#[tokio::test]
async fn author_edit_changes_text_and_group_only() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let group = common::create_test_group(&app).await;
    let new_group = common::create_test_group(&app).await;
    let original = common::create_test_post(&app, &author, "Original text", Some(group.id)).await;
    let before = common::post_count(&app).await;

    let new_group_id = new_group.id.to_string();
    let resp = app
        .post_form(
            &format!("/posts/{}/edit/", original.id),
            Some(&author),
            &[("text", "Edited text"), ("group", new_group_id.as_str())],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), format!("/posts/{}/", original.id));

    let edited = reload(&app, original.id).await;
    assert_eq!(edited.text, "Edited text");
    assert_eq!(edited.group_id, Some(new_group.id));
    assert_eq!(edited.author_id, original.author_id);
    assert_eq!(edited.pub_date, original.pub_date);
    assert_eq!(common::post_count(&app).await, before);
}

#[tokio::test]
async fn edit_can_clear_group() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let group = common::create_test_group(&app).await;
    let original = common::create_test_post(&app, &author, "Original text", Some(group.id)).await;

    let resp = app
        .post_form(
            &format!("/posts/{}/edit/", original.id),
            Some(&author),
            &[("text", "Original text"), ("group", "")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(reload(&app, original.id).await.group_id, None);
}

#[tokio::test]
async fn non_author_edit_leaves_post_unchanged() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let other = common::create_test_user(&app, "not_author").await;
    let original = common::create_test_post(&app, &author, "Original text", None).await;

    let resp = app
        .post_form(
            &format!("/posts/{}/edit/", original.id),
            Some(&other),
            &[("text", "Hijacked")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), format!("/posts/{}/", original.id));
    assert_eq!(reload(&app, original.id).await, original);
}

#[tokio::test]
async fn anonymous_edit_leaves_post_unchanged() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let original = common::create_test_post(&app, &author, "Original text", None).await;

    let path = format!("/posts/{}/edit/", original.id);
    let resp = app.post_form(&path, None, &[("text", "Hijacked")]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), format!("/auth/login/?next={path}"));
    assert_eq!(reload(&app, original.id).await, original);
}

#[tokio::test]
async fn invalid_edit_redisplays_form() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "auth").await;
    let original = common::create_test_post(&app, &author, "Original text", None).await;

    let resp = app
        .post_form(
            &format!("/posts/{}/edit/", original.id),
            Some(&author),
            &[("text", "")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(reload(&app, original.id).await, original);
}
