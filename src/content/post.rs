//! Post model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::frontmatter::parse_date_string;

/// A blog post.
///
/// Collection listings carry metadata only; `content_html` is filled when a
/// single post is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Source filename without extension
    pub id: String,

    /// Title from front-matter
    pub title: String,

    /// Date from front-matter, as written
    pub date: String,

    /// Rendered HTML body
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_html: Option<String>,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a post with metadata only
    pub fn new(id: String, title: String, date: String) -> Self {
        Self {
            id,
            title,
            date,
            content_html: None,
            extra: IndexMap::new(),
        }
    }

    /// Key that orders posts chronologically.
    ///
    /// Parseable dates are normalized so `2020-1-5` style values still compare
    /// correctly; anything else falls back to the raw string.
    pub fn sort_key(&self) -> String {
        parse_date_string(&self.date)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_else(|| self.date.clone())
    }
}

/// Sort posts newest first. Stable, so equal dates keep their input order.
pub fn sort_by_date_desc(posts: &mut [Post]) {
    posts.sort_by_cached_key(|p| std::cmp::Reverse(p.sort_key()));
}
