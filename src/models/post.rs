//! Post model matching the frontend Post interface.

use serde::{Deserialize, Serialize};

/// A blog post as stored and served to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub featured: bool,
    pub published: bool,
}

/// Request body for creating a new post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
}

/// Request body for updating an existing post. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Query filters for listing posts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

impl PostFilters {
    /// Canonical cache key for this filter combination.
    ///
    /// Two requests with the same filters must map to the same key so that
    /// concurrent identical reads coalesce.
    pub fn cache_key(&self) -> String {
        format!(
            "posts:c={};f={};p={};s={}",
            self.category.as_deref().unwrap_or(""),
            self.featured.map(|b| b.to_string()).unwrap_or_default(),
            self.published.map(|b| b.to_string()).unwrap_or_default(),
            self.search.as_deref().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_canonical() {
        let a = PostFilters {
            category: Some("design".to_string()),
            published: Some(true),
            ..Default::default()
        };
        let b = PostFilters {
            category: Some("design".to_string()),
            published: Some(true),
            ..Default::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_differs_per_filter() {
        let all = PostFilters::default();
        let featured = PostFilters {
            featured: Some(true),
            ..Default::default()
        };
        assert_ne!(all.cache_key(), featured.cache_key());
    }
}
