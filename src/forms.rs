//! The post create/edit form: parsing, validation and the descriptor the
//! `create_post` page is rendered from.

use crate::models::{GroupModel, PostModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str = "Select a valid choice.";
const EMPTY_CHOICE_LABEL: &str = "---------";

/// Raw submission, as posted by the browser.
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct PostFormData {
    /// Post body
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Group id; empty for no group
    #[serde(default)]
    pub group: Option<String>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldView {
    /// Field class: `CharField` or `ChoiceField`
    pub kind: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostFormFields {
    pub text: FieldView,
    pub group: FieldView,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormView {
    pub fields: PostFormFields,
    pub is_valid: bool,
}

pub struct PostForm {
    data: PostFormData,
    groups: Vec<GroupModel>,
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl PostForm {
    /// Empty form for the create page.
    pub fn blank(groups: Vec<GroupModel>) -> Self {
        Self::bind(PostFormData::default(), groups)
    }

    /// Form pre-filled with an existing post, for the edit page.
    pub fn for_post(post: &PostModel, groups: Vec<GroupModel>) -> Self {
        let data = PostFormData {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
        };
        Self::bind(data, groups)
    }

    pub fn bind(data: PostFormData, groups: Vec<GroupModel>) -> Self {
        Self {
            data,
            groups,
            errors: BTreeMap::new(),
        }
    }

    /// Validate the bound data. Surrounding whitespace of the text is
    /// stripped first, so a whitespace-only body counts as missing.
    pub fn clean(&mut self) -> Option<CleanedPost> {
        self.errors.clear();
        self.data.text = self.data.text.trim().to_string();

        if let Err(errors) = self.data.validate() {
            if let Some(text_errors) = errors.field_errors().get("text") {
                let messages = text_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| REQUIRED_MESSAGE.to_string())
                    })
                    .collect();
                self.errors.insert("text", messages);
            }
        }

        let group_id = match self.clean_group() {
            Ok(group_id) => group_id,
            Err(message) => {
                self.errors.entry("group").or_default().push(message);
                None
            }
        };

        if !self.errors.is_empty() {
            return None;
        }

        Some(CleanedPost {
            text: self.data.text.clone(),
            group_id,
        })
    }

    fn clean_group(&self) -> Result<Option<i32>, String> {
        let raw = match self.data.group.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };

        raw.parse::<i32>()
            .ok()
            .filter(|id| self.groups.iter().any(|g| g.id == *id))
            .map(Some)
            .ok_or_else(|| INVALID_CHOICE_MESSAGE.to_string())
    }

    /// Record an error found only while saving, after `clean` passed.
    pub fn add_error(&mut self, field: &'static str, message: String) {
        self.errors.entry(field).or_default().push(message);
    }

    pub fn errors(&self) -> &BTreeMap<&'static str, Vec<String>> {
        &self.errors
    }

    pub fn view(&self) -> FormView {
        let mut choices = vec![Choice {
            value: String::new(),
            label: EMPTY_CHOICE_LABEL.to_string(),
        }];
        choices.extend(self.groups.iter().map(|g| Choice {
            value: g.id.to_string(),
            label: g.to_string(),
        }));

        let field_errors = |name: &str| self.errors.get(name).cloned().unwrap_or_default();

        FormView {
            fields: PostFormFields {
                text: FieldView {
                    kind: "CharField",
                    label: "Text",
                    help_text: "Enter the post text",
                    required: true,
                    value: self.data.text.clone(),
                    choices: None,
                    errors: field_errors("text"),
                },
                group: FieldView {
                    kind: "ChoiceField",
                    label: "Group",
                    help_text: "Group the post will belong to",
                    required: false,
                    value: self.data.group.clone().unwrap_or_default(),
                    choices: Some(choices),
                    errors: field_errors("group"),
                },
            },
            is_valid: self.errors.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<GroupModel> {
        vec![GroupModel {
            id: 3,
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: "All about cats".to_string(),
        }]
    }

    fn form(text: &str, group: Option<&str>) -> PostForm {
        PostForm::bind(
            PostFormData {
                text: text.to_string(),
                group: group.map(str::to_string),
            },
            groups(),
        )
    }

    #[test]
    fn valid_without_group() {
        let cleaned = form("hello", None).clean().unwrap();
        assert_eq!(
            cleaned,
            CleanedPost {
                text: "hello".to_string(),
                group_id: None
            }
        );
    }

    #[test]
    fn empty_group_means_none() {
        let cleaned = form("hello", Some("")).clean().unwrap();
        assert_eq!(cleaned.group_id, None);
    }

    #[test]
    fn valid_with_existing_group() {
        let cleaned = form("hello", Some("3")).clean().unwrap();
        assert_eq!(cleaned.group_id, Some(3));
    }

    #[test]
    fn text_is_trimmed() {
        let cleaned = form("  hello \n", None).clean().unwrap();
        assert_eq!(cleaned.text, "hello");
    }

    #[test]
    fn blank_text_is_required() {
        let mut f = form("   ", None);
        assert!(f.clean().is_none());
        assert_eq!(f.errors()["text"], vec![REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn unknown_group_is_invalid_choice() {
        let mut f = form("hello", Some("99"));
        assert!(f.clean().is_none());
        assert_eq!(f.errors()["group"], vec![INVALID_CHOICE_MESSAGE.to_string()]);
    }

    #[test]
    fn non_numeric_group_is_invalid_choice() {
        let mut f = form("hello", Some("cats"));
        assert!(f.clean().is_none());
        assert!(f.errors().contains_key("group"));
    }

    #[test]
    fn late_error_invalidates_view() {
        let mut f = form("hello", Some("3"));
        assert!(f.clean().is_some());
        f.add_error("group", INVALID_CHOICE_MESSAGE.to_string());

        let view = f.view();
        assert!(!view.is_valid);
        assert_eq!(view.fields.group.errors, vec![INVALID_CHOICE_MESSAGE.to_string()]);
        assert!(view.fields.text.errors.is_empty());
    }

    #[test]
    fn view_lists_field_kinds_and_choices() {
        let view = PostForm::blank(groups()).view();
        assert_eq!(view.fields.text.kind, "CharField");
        assert_eq!(view.fields.group.kind, "ChoiceField");
        let choices = view.fields.group.choices.unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].value, "");
        assert_eq!(choices[1].value, "3");
        assert_eq!(choices[1].label, "Cats");
    }

    #[test]
    fn view_prefills_from_post() {
        let post = PostModel {
            id: 1,
            text: "existing".to_string(),
            pub_date: chrono::Utc::now().naive_utc(),
            author_id: 1,
            group_id: Some(3),
        };
        let view = PostForm::for_post(&post, groups()).view();
        assert_eq!(view.fields.text.value, "existing");
        assert_eq!(view.fields.group.value, "3");
    }
}
