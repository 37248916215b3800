use crate::domain::validation::{ValidationErrors, MAX_STRING_LENGTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both the create and the update request. Fields stay optional so
/// that a missing field is reported by the validation gate instead of failing
/// JSON deserialization.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Title and description that passed the shape rules. Uniqueness is checked
/// separately because it needs the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub description: String,
}

impl PostInput {
    pub fn validate(&self) -> Result<PostFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.require("title", self.title.as_deref());
        if let Some(title) = title {
            errors.max_chars("title", title, MAX_STRING_LENGTH);
        }

        let description = errors.require("description", self.description.as_deref());
        if let Some(description) = description {
            errors.max_chars("description", description, MAX_STRING_LENGTH);
        }

        match (title, description) {
            (Some(title), Some(description)) if errors.is_empty() => Ok(PostFields {
                title: title.to_string(),
                description: description.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Public projection of a post used by list, read and create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResource {
    pub id: i64,
    pub title: String,
    pub description: String,
}

impl From<Post> for PostResource {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_accepted_fields() {
        let input = PostInput {
            title: Some("  Hello ".into()),
            description: Some("World".into()),
        };
        assert_eq!(
            input.validate().unwrap(),
            PostFields {
                title: "Hello".into(),
                description: "World".into()
            }
        );
    }

    #[test]
    fn reports_every_failing_field() {
        let input = PostInput {
            title: None,
            description: Some("d".repeat(256)),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.has("title"));
        assert_eq!(
            errors.messages("description"),
            ["The description field must not be greater than 255 characters.".to_string()]
        );
    }

    #[test]
    fn resource_hides_timestamps() {
        let now = Utc::now();
        let post = Post {
            id: 7,
            title: "t".into(),
            description: "d".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(PostResource::from(post)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 7, "title": "t", "description": "d" })
        );
    }
}
