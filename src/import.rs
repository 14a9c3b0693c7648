//! WordPress export (WXR) import.
//!
//! First stage of the pipeline. Parses the export document into the three
//! record collections and persists them to the record store:
//!
//! ```text
//! export.xml  →  posts.json + pages.json + attachments.json
//! ```
//!
//! ## Two passes
//!
//! Attachments are collected first, because posts reference them by id for
//! featured images (`_thumbnail_id` post-meta). The second pass classifies
//! the remaining items into posts and pages, resolving featured-image ids
//! against the pass-1 collection. Unresolved ids are advisory — the export
//! is known to contain gaps — and leave the featured-image fields absent.
//!
//! ## Ordering
//!
//! Posts are sorted newest-first by publish date. WordPress dates are
//! fixed-format `YYYY-MM-DD HH:MM:SS`, so a string compare is
//! chronological; the sort is stable, so same-date posts keep their
//! document order.
//!
//! ## Failure
//!
//! Malformed XML aborts the whole import before anything is written —
//! there is no partial output. Missing fields on an item default to empty.

use crate::records::{Attachment, Page, Post, filename_from_url};
use crate::store::{RecordStore, StoreError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed export XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The three collections produced by one import run.
#[derive(Debug, Default, PartialEq)]
pub struct ExportData {
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub attachments: Vec<Attachment>,
}

/// Parse the export at `export_path` and replace the store's collections.
///
/// Parsing completes before any file is touched, so a malformed export
/// leaves the prior store contents intact.
pub fn import(export_path: &Path, store: &RecordStore) -> Result<ExportData, ImportError> {
    let xml = std::fs::read_to_string(export_path)?;
    let data = parse_export(&xml)?;
    store.save_attachments(&data.attachments)?;
    store.save_posts(&data.posts)?;
    store.save_pages(&data.pages)?;
    Ok(data)
}

/// Parse a WXR document into record collections. Pure — no I/O.
pub fn parse_export(xml: &str) -> Result<ExportData, ImportError> {
    let items = read_items(xml)?;

    // Pass 1: attachments, keyed by id for featured-image resolution.
    let mut attachments: Vec<Attachment> = Vec::new();
    let mut url_by_id: HashMap<u32, String> = HashMap::new();
    for item in &items {
        if item.post_type != "attachment" || item.attachment_url.is_empty() {
            continue;
        }
        if url_by_id.contains_key(&item.post_id) {
            continue; // collection ids must stay unique
        }
        url_by_id.insert(item.post_id, item.attachment_url.clone());
        attachments.push(Attachment {
            id: item.post_id,
            title: item.title.clone(),
            url: item.attachment_url.clone(),
            filename: filename_from_url(&item.attachment_url),
            parent_id: item.parent_id,
            sizes: None,
        });
    }

    // Pass 2: posts and pages.
    let mut posts: Vec<Post> = Vec::new();
    let mut pages: Vec<Page> = Vec::new();
    let mut seen_posts: HashSet<u32> = HashSet::new();
    let mut seen_pages: HashSet<u32> = HashSet::new();
    for item in &items {
        if item.status == "private" || item.post_type == "attachment" {
            continue;
        }

        match item.post_type.as_str() {
            "post" => {
                if !seen_posts.insert(item.post_id) {
                    continue;
                }
                let (featured_image_id, featured_image_url) =
                    resolve_featured_image(item, &url_by_id);
                posts.push(Post {
                    id: item.post_id,
                    title: item.title.clone(),
                    content: item.content.clone(),
                    excerpt: item.excerpt.clone(),
                    date: item.date.clone(),
                    modified: item.modified.clone(),
                    slug: item.slug.clone(),
                    status: item.status.clone(),
                    author: item.creator.clone(),
                    categories: item.taxonomy("category"),
                    tags: item.taxonomy("post_tag"),
                    link: item.link.clone(),
                    featured_image_id,
                    featured_image_url,
                });
            }
            "page" => {
                if !seen_pages.insert(item.post_id) {
                    continue;
                }
                pages.push(Page {
                    id: item.post_id,
                    title: item.title.clone(),
                    content: item.content.clone(),
                    date: item.date.clone(),
                    modified: item.modified.clone(),
                    slug: item.slug.clone(),
                    status: item.status.clone(),
                    author: item.creator.clone(),
                    link: item.link.clone(),
                });
            }
            // Menus, revisions, custom types: not part of the site.
            _ => {}
        }
    }

    // Newest first; stable, so same-date posts keep document order.
    posts.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(ExportData {
        posts,
        pages,
        attachments,
    })
}

/// `_thumbnail_id` meta resolved against pass-1 attachments. Both fields
/// stay absent unless the id actually resolves.
fn resolve_featured_image(
    item: &RawItem,
    url_by_id: &HashMap<u32, String>,
) -> (Option<u32>, Option<String>) {
    let Some(value) = item.meta_value("_thumbnail_id") else {
        return (None, None);
    };
    let Ok(id) = value.trim().parse::<u32>() else {
        return (None, None);
    };
    match url_by_id.get(&id) {
        Some(url) => (Some(id), Some(url.clone())),
        None => (None, None),
    }
}

// ============================================================================
// WXR item reading
// ============================================================================

/// One `<item>` element, fields as they appear in the document.
#[derive(Debug, Default)]
struct RawItem {
    post_id: u32,
    post_type: String,
    status: String,
    title: String,
    link: String,
    creator: String,
    content: String,
    excerpt: String,
    date: String,
    modified: String,
    slug: String,
    parent_id: u32,
    attachment_url: String,
    /// (taxonomy domain, name) pairs from `<category domain="...">`.
    categories: Vec<(String, String)>,
    /// (key, value) pairs from `<wp:postmeta>`.
    meta: Vec<(String, String)>,
}

impl RawItem {
    fn taxonomy(&self, domain: &str) -> Vec<String> {
        self.categories
            .iter()
            .filter(|(d, _)| d == domain)
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Text destination while inside an `<item>`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Creator,
    Content,
    Excerpt,
    PostId,
    Date,
    Modified,
    Slug,
    Status,
    ParentId,
    PostType,
    AttachmentUrl,
    Category,
    MetaKey,
    MetaValue,
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"dc:creator" => Some(Field::Creator),
        b"content:encoded" => Some(Field::Content),
        b"excerpt:encoded" => Some(Field::Excerpt),
        b"wp:post_id" => Some(Field::PostId),
        b"wp:post_date" => Some(Field::Date),
        b"wp:post_modified" => Some(Field::Modified),
        b"wp:post_name" => Some(Field::Slug),
        b"wp:status" => Some(Field::Status),
        b"wp:post_parent" => Some(Field::ParentId),
        b"wp:post_type" => Some(Field::PostType),
        b"wp:attachment_url" => Some(Field::AttachmentUrl),
        b"category" => Some(Field::Category),
        b"wp:meta_key" => Some(Field::MetaKey),
        b"wp:meta_value" => Some(Field::MetaValue),
        _ => None,
    }
}

/// Event-reader pass collecting every `<item>` in document order.
fn read_items(xml: &str) -> Result<Vec<RawItem>, ImportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items: Vec<RawItem> = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;
    let mut buf = String::new();
    let mut category_domain = String::new();
    let mut meta_key = String::new();

    loop {
        match reader.read_event().map_err(quick_xml::Error::from)? {
            Event::Start(e) => {
                if e.name().as_ref() == b"item" {
                    current = Some(RawItem::default());
                } else if current.is_some() {
                    field = field_for(e.name().as_ref());
                    buf.clear();
                    if field == Some(Field::Category) {
                        category_domain = attribute(&e, "domain")?;
                    }
                }
            }
            Event::Text(e) => {
                if current.is_some() && field.is_some() {
                    buf.push_str(&e.decode().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(e) => {
                if current.is_some() && field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::GeneralRef(e) => {
                // Entity references arrive as their own events; fold them
                // back into the accumulating text.
                if current.is_some() && field.is_some() {
                    let name = String::from_utf8_lossy(&e).into_owned();
                    match resolve_entity(&name) {
                        Some(ch) => buf.push(ch),
                        None => {
                            buf.push('&');
                            buf.push_str(&name);
                            buf.push(';');
                        }
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                    field = None;
                } else if let Some(item) = current.as_mut() {
                    if let Some(f) = field.take() {
                        commit_field(item, f, &buf, &category_domain, &mut meta_key);
                        buf.clear();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn commit_field(
    item: &mut RawItem,
    field: Field,
    text: &str,
    category_domain: &str,
    meta_key: &mut String,
) {
    match field {
        Field::Title => item.title = text.to_string(),
        Field::Link => item.link = text.to_string(),
        Field::Creator => item.creator = text.to_string(),
        Field::Content => item.content = text.to_string(),
        Field::Excerpt => item.excerpt = text.to_string(),
        Field::PostId => item.post_id = text.trim().parse().unwrap_or(0),
        Field::Date => item.date = text.to_string(),
        Field::Modified => item.modified = text.to_string(),
        Field::Slug => item.slug = text.to_string(),
        Field::Status => item.status = text.to_string(),
        Field::ParentId => item.parent_id = text.trim().parse().unwrap_or(0),
        Field::PostType => item.post_type = text.to_string(),
        Field::AttachmentUrl => item.attachment_url = text.to_string(),
        Field::Category => item
            .categories
            .push((category_domain.to_string(), text.to_string())),
        Field::MetaKey => *meta_key = text.to_string(),
        Field::MetaValue => item
            .meta
            .push((std::mem::take(meta_key), text.to_string())),
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<String, ImportError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
        .map(|a| {
            a.unescape_value()
                .map(|v| v.into_owned())
                .map_err(quick_xml::Error::from)
        })
        .transpose()?;
    Ok(attr.unwrap_or_default())
}

/// Predefined XML entities plus numeric character references.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let cp = if let Some(hex) = num.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse().ok()?
            };
            char::from_u32(cp)
        }
    }
}
