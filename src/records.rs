//! Record types persisted between pipeline stages.
//!
//! These types are serialized to the record store JSON files
//! (`posts.json`, `pages.json`, `attachments.json`) and must keep the
//! camelCase field names the original export established — downstream
//! consumers read these files directly.
//!
//! Defaulting happens here, at the serde boundary: every optional export
//! field deserializes to an empty string/collection or `None`, so call
//! sites never deal with missing keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A blog post imported from the export.
///
/// Created once by the importer; the `content` and `excerpt` fields are
/// rewritten in place by later stages. Never deleted — a re-import rebuilds
/// the whole collection from the source export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    /// Publish date, WordPress format: `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Originating permalink on the WordPress site.
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
}

/// A static page. Same lifecycle as [`Post`], simpler shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub link: String,
}

/// A media attachment.
///
/// Created by the importer's first pass (posts resolve featured images
/// against these by id). The `url` starts as the absolute WordPress URL and
/// is rewritten to a site-relative path by the migration step; `filename` is
/// always the final path segment of `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub filename: String,
    /// Parent post/page id, 0 if unattached.
    #[serde(default)]
    pub parent_id: u32,
    /// Named WordPress sizes ("thumbnail", "medium", ...) when the export
    /// carried them. BTreeMap keeps the serialized order deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<BTreeMap<String, SizeVariant>>,
}

/// One named size entry on an attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeVariant {
    #[serde(default)]
    pub url: String,
}

/// Basename of a URL's path: everything after the last `/`, query stripped.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_camel_case() {
        let post = Post {
            id: 7,
            featured_image_id: Some(42),
            featured_image_url: Some("/wp-content/uploads/a.jpg".into()),
            ..Post::default()
        };
        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"featuredImageId\":42"));
        assert!(json.contains("\"featuredImageUrl\""));
        assert!(!json.contains("featured_image"));
    }

    #[test]
    fn absent_featured_image_is_omitted_not_null() {
        let json = serde_json::to_string(&Post::default()).unwrap();
        assert!(!json.contains("featuredImageId"));
        assert!(!json.contains("null"));
    }

    #[test]
    fn post_deserializes_with_missing_optionals() {
        let post: Post = serde_json::from_str(r#"{"id": 3, "title": "hello"}"#).unwrap();
        assert_eq!(post.id, 3);
        assert_eq!(post.title, "hello");
        assert!(post.categories.is_empty());
        assert!(post.featured_image_url.is_none());
    }

    #[test]
    fn attachment_parent_id_defaults_to_zero() {
        let att: Attachment =
            serde_json::from_str(r#"{"id": 9, "url": "https://x/y/z.png"}"#).unwrap();
        assert_eq!(att.parent_id, 0);
        assert!(att.sizes.is_none());
    }

    #[test]
    fn attachment_sizes_round_trip() {
        let mut sizes = BTreeMap::new();
        sizes.insert(
            "thumbnail".to_string(),
            SizeVariant {
                url: "/wp-content/uploads/a-150x150.jpg".into(),
            },
        );
        let att = Attachment {
            id: 1,
            sizes: Some(sizes),
            ..Attachment::default()
        };
        let json = serde_json::to_string(&att).unwrap();
        let back: Attachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, att);
    }

    #[test]
    fn filename_from_url_takes_last_segment() {
        assert_eq!(
            filename_from_url("https://web.example.com/wp-content/uploads/2024/06/photo.jpg"),
            "photo.jpg"
        );
        assert_eq!(filename_from_url("/uploads/a.png"), "a.png");
        assert_eq!(filename_from_url("https://h/p/img.jpg?w=300"), "img.jpg");
        assert_eq!(filename_from_url(""), "");
    }
}
