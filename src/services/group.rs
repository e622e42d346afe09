use crate::{
    error::{AppError, AppResult},
    models::{group, post, Group, GroupModel, Post},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

pub struct GroupService {
    db: DatabaseConnection,
}

impl GroupService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every group, ordered by title. Feeds the group choice of the post form.
    pub async fn list(&self) -> AppResult<Vec<GroupModel>> {
        let groups = Group::find()
            .order_by_asc(group::Column::Title)
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await?;
        Ok(groups)
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<GroupModel> {
        Group::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, title: &str, slug: &str, description: &str) -> AppResult<GroupModel> {
        let taken = Group::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Conflict(format!(
                "Group with slug '{slug}' already exists"
            )));
        }

        let new_group = group::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            slug: sea_orm::ActiveValue::Set(slug.to_string()),
            description: sea_orm::ActiveValue::Set(description.to_string()),
            ..Default::default()
        };

        let group = new_group.insert(&self.db).await?;
        tracing::info!(group_id = group.id, slug, "Group created");
        Ok(group)
    }

    /// Delete a group. Its posts survive with their group link cleared.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let existing = self.get_by_slug(slug).await?;

        let txn = self.db.begin().await?;
        let detached = Post::update_many()
            .col_expr(post::Column::GroupId, Expr::value(sea_orm::Value::Int(None)))
            .filter(post::Column::GroupId.eq(existing.id))
            .exec(&txn)
            .await?;
        Group::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            group_id = existing.id,
            slug,
            detached_posts = detached.rows_affected,
            "Group deleted"
        );
        Ok(())
    }
}
