//! WordPress.com v1.1 response shapes and their mapping onto portal types.

use chrono::DateTime;
use portal::{Attachment, Post, PostList};
use serde::{Deserialize, Deserializer};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub(crate) struct PostsResponse {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub posts: Vec<WpPost>,
}

/// Reads the id out of a post's `parent` object; WordPress sends `false` when
/// there is no parent.
fn parent_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.get("ID").and_then(|id| id.as_u64()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct WpPost {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    // Both are objects keyed by name/id, or `[]` when empty.
    #[serde(default)]
    pub categories: serde_json::Value,
    #[serde(default)]
    pub attachments: serde_json::Value,
    #[serde(default, deserialize_with = "parent_id")]
    pub parent: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WpAttachment {
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

/// Body of an API-level error (`{"error": "unknown_post", "message": "..."}`).
#[derive(Debug, Deserialize)]
pub(crate) struct WpError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl WpPost {
    pub fn into_post(self) -> Post {
        let parse_date = |field: &str, value: Option<String>| {
            let value = value.filter(|v| !v.is_empty())?;
            match DateTime::parse_from_rfc3339(&value) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!(slug = %self.slug, field, value = %value, error = %e, "unparseable post date");
                    None
                }
            }
        };
        let date = parse_date("date", self.date.clone());
        let modified = parse_date("modified", self.modified.clone());

        let categories = match &self.categories {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        let attachments = match &self.attachments {
            serde_json::Value::Object(map) => map
                .values()
                .filter_map(|v| serde_json::from_value::<WpAttachment>(v.clone()).ok())
                .map(|a| Attachment {
                    url: a.url,
                    caption: a.caption,
                    alt: a.alt,
                })
                .collect(),
            _ => Vec::new(),
        };

        Post {
            id: self.id,
            slug: self.slug,
            title: self.title,
            content: self.content,
            date,
            modified,
            featured_image: self.featured_image,
            categories,
            attachments,
        }
    }
}

impl PostsResponse {
    pub fn into_post_list(self) -> PostList {
        PostList {
            found: self.found,
            posts: self.posts.into_iter().map(WpPost::into_post).collect(),
        }
    }
}
