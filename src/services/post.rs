use crate::{
    error::{AppError, AppResult},
    forms::{CleanedPost, INVALID_CHOICE_MESSAGE},
    models::{group, post, user, Group, GroupModel, Post, PostModel, User, UserModel},
    response::{clamp_page, PaginatedResponse},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, SqlErr,
};
use serde::Serialize;
use std::collections::HashMap;

/// Which posts a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    All,
    Group(i32),
    Author(i32),
}

impl Feed {
    fn apply(self, query: Select<Post>) -> Select<Post> {
        match self {
            Feed::All => query,
            Feed::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Feed::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
        }
    }
}

/// A post together with the rows it points at.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithRelations {
    pub post: PostModel,
    pub author: UserModel,
    pub group: Option<GroupModel>,
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// One page of a feed, newest first. Out-of-range page numbers are
    /// clamped to the nearest existing page.
    pub async fn feed(
        &self,
        feed: Feed,
        page: u64,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostWithRelations>> {
        let paginator = feed
            .apply(Post::find())
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let number = clamp_page(page, total, per_page);
        let posts = paginator.fetch_page(number - 1).await?;
        let items = self.attach_relations(posts).await?;

        Ok(PaginatedResponse::new(items, total, number, per_page))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_detail(&self, id: i32) -> AppResult<PostWithRelations> {
        let post = self.get_by_id(id).await?;
        self.attach_relations(vec![post])
            .await?
            .pop()
            .ok_or(AppError::NotFound)
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(Post::find().count(&self.db).await?)
    }

    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        Ok(Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?)
    }

    pub async fn create(&self, author_id: i32, cleaned: &CleanedPost) -> AppResult<PostModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_post = post::ActiveModel {
            text: sea_orm::ActiveValue::Set(cleaned.text.clone()),
            pub_date: sea_orm::ActiveValue::Set(now),
            author_id: sea_orm::ActiveValue::Set(author_id),
            group_id: sea_orm::ActiveValue::Set(cleaned.group_id),
            ..Default::default()
        };

        let post = new_post
            .insert(&self.db)
            .await
            .map_err(|e| vanished_group(e, cleaned))?;
        tracing::info!(post_id = post.id, author_id, "Post created");
        Ok(post)
    }

    /// Replace text and group of a post. Author and `pub_date` never change.
    pub async fn update(
        &self,
        id: i32,
        author_id: i32,
        cleaned: &CleanedPost,
    ) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != author_id {
            return Err(AppError::Forbidden);
        }

        let mut active: post::ActiveModel = existing.into();
        active.text = sea_orm::ActiveValue::Set(cleaned.text.clone());
        active.group_id = sea_orm::ActiveValue::Set(cleaned.group_id);

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| vanished_group(e, cleaned))?;
        tracing::info!(post_id = id, "Post updated");
        Ok(updated)
    }

    /// Batch-load authors and groups for a page of posts, keeping order.
    async fn attach_relations(&self, posts: Vec<PostModel>) -> AppResult<Vec<PostWithRelations>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
        let group_ids: Vec<i32> = posts.iter().filter_map(|p| p.group_id).collect();

        let authors: HashMap<i32, UserModel> = User::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let groups: HashMap<i32, GroupModel> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            Group::find()
                .filter(group::Column::Id.is_in(group_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|g| (g.id, g))
                .collect()
        };

        posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("post {} has no author", post.id))
                })?;
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                Ok(PostWithRelations {
                    post,
                    author,
                    group,
                })
            })
            .collect()
    }
}

/// The group choice is checked against a list read before the write. A group
/// deleted in between trips the foreign key; report it as a bad choice.
fn vanished_group(err: DbErr, cleaned: &CleanedPost) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) if cleaned.group_id.is_some() => {
            AppError::Validation(INVALID_CHOICE_MESSAGE.to_string())
        }
        _ => err.into(),
    }
}
