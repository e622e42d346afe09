use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of characters of the text used as the post's display form.
pub const DISPLAY_CHARS: usize = 15;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub pub_date: DateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short: String = self.text.chars().take(DISPLAY_CHARS).collect();
        f.write_str(&short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_text(text: &str) -> Model {
        Model {
            id: 1,
            text: text.to_string(),
            pub_date: chrono::Utc::now().naive_utc(),
            author_id: 1,
            group_id: None,
        }
    }

    #[test]
    fn display_truncates_long_text() {
        let post = post_with_text("A rather long test post body");
        assert_eq!(post.to_string(), "A rather long t");
    }

    #[test]
    fn display_keeps_short_text() {
        let post = post_with_text("Short");
        assert_eq!(post.to_string(), "Short");
    }

    #[test]
    fn display_counts_characters_not_bytes() {
        let post = post_with_text("Тестовый пост для проверки");
        assert_eq!(post.to_string(), "Тестовый пост д");
    }
}
