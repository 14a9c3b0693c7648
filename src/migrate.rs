//! Media migration: move WordPress-hosted images into the public tree.
//!
//! Runs after the import, before variants are derived. For every attachment
//! whose URL still points at the origin WordPress host:
//!
//! 1. download the file into `public/` at its site-relative path
//!    (`https://host/wp-content/uploads/X` → `public/wp-content/uploads/X`),
//! 2. rewrite the attachment's `url` (and any named size URLs) to the
//!    site-relative form,
//! 3. rewrite origin-host upload URLs inside post/page content, excerpts
//!    and featured-image fields.
//!
//! A failed download is per-item recoverable: the record keeps its remote
//! URL and the next full run retries it. Files already present locally are
//! not fetched again, so an interrupted migration resumes where it left
//! off.
//!
//! Fetching sits behind the [`Fetcher`] trait so tests exercise the
//! migration logic without a network.

use crate::store::{RecordStore, StoreError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
}

/// One remote asset → one local file.
pub trait Fetcher: Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Production fetcher: blocking reqwest, redirects followed, transient
/// failures (connect errors, 5xx) retried a fixed number of times.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, MigrateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, retries: 2 })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut last_err = None;
        for _ in 0..=self.retries {
            match self.try_fetch(url, dest) {
                Ok(()) => return Ok(()),
                Err((err, transient)) => {
                    last_err = Some(err);
                    if !transient {
                        break;
                    }
                }
            }
        }
        Err(last_err.expect("at least one attempt ran"))
    }
}

impl HttpFetcher {
    fn try_fetch(&self, url: &str, dest: &Path) -> Result<(), (FetchError, bool)> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                let transient = e.status().is_none_or(|s| s.is_server_error());
                (FetchError::Http(e.to_string()), transient)
            })?;
        let bytes = response
            .bytes()
            .map_err(|e| (FetchError::Http(e.to_string()), true))?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| (FetchError::Io(e), false))?;
        }
        std::fs::write(dest, &bytes).map_err(|e| (FetchError::Io(e), false))?;
        Ok(())
    }
}

/// Counts from one migration run.
#[derive(Debug, Default, PartialEq)]
pub struct MigrateSummary {
    pub downloaded: usize,
    /// Already present locally — URL localized without a fetch.
    pub skipped: usize,
    /// Failed downloads; those records keep their remote URL.
    pub failed: usize,
    pub attachments_localized: usize,
    pub posts_rewritten: usize,
    pub pages_rewritten: usize,
}

/// Run the migration against the store.
pub fn migrate_images(
    store: &RecordStore,
    fetcher: &impl Fetcher,
    base_url: &str,
    public_dir: &Path,
) -> Result<MigrateSummary, MigrateError> {
    let mut summary = MigrateSummary::default();

    let mut attachments = store.load_attachments()?;
    for att in &mut attachments {
        let mut changed = false;

        if let Some(local) =
            localize_url(&att.url, fetcher, base_url, public_dir, &mut summary)
        {
            att.url = local;
            changed = true;
        }
        if let Some(sizes) = &mut att.sizes {
            for size in sizes.values_mut() {
                if let Some(local) =
                    localize_url(&size.url, fetcher, base_url, public_dir, &mut summary)
                {
                    size.url = local;
                    changed = true;
                }
            }
        }

        if changed {
            summary.attachments_localized += 1;
        }
    }
    store.save_attachments(&attachments)?;

    let upload_url = upload_url_pattern(base_url);

    let mut posts = store.load_posts()?;
    for post in &mut posts {
        let content = upload_url.replace_all(&post.content, "$rel").into_owned();
        let excerpt = upload_url.replace_all(&post.excerpt, "$rel").into_owned();
        let featured = post
            .featured_image_url
            .as_ref()
            .map(|url| relative_form(url, base_url));

        if content != post.content
            || excerpt != post.excerpt
            || featured != post.featured_image_url
        {
            post.content = content;
            post.excerpt = excerpt;
            post.featured_image_url = featured;
            summary.posts_rewritten += 1;
        }
    }
    store.save_posts(&posts)?;

    let mut pages = store.load_pages()?;
    for page in &mut pages {
        let content = upload_url.replace_all(&page.content, "$rel").into_owned();
        if content != page.content {
            page.content = content;
            summary.pages_rewritten += 1;
        }
    }
    store.save_pages(&pages)?;

    Ok(summary)
}

/// Origin-host upload URL, capturing the site-relative part.
fn upload_url_pattern(base_url: &str) -> Regex {
    Regex::new(&format!(
        r#"{}(?P<rel>/wp-content/uploads/[^"'\s>]+)"#,
        regex::escape(base_url)
    ))
    .expect("escaped base URL forms a valid pattern")
}

fn relative_form(url: &str, base_url: &str) -> String {
    match url.strip_prefix(base_url) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => url.to_string(),
    }
}

/// Fetch one origin-host URL into the public tree if needed.
///
/// Returns the site-relative replacement URL, or `None` when the record
/// must keep its current URL (foreign host, or the download failed).
fn localize_url(
    url: &str,
    fetcher: &impl Fetcher,
    base_url: &str,
    public_dir: &Path,
    summary: &mut MigrateSummary,
) -> Option<String> {
    let rel = match url.strip_prefix(base_url) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => return None,
    };

    let dest: PathBuf = public_dir.join(rel.trim_start_matches('/'));
    if dest.exists() {
        summary.skipped += 1;
        return Some(rel);
    }

    match fetcher.fetch(url, &dest) {
        Ok(()) => {
            summary.downloaded += 1;
            Some(rel)
        }
        Err(_) => {
            summary.failed += 1;
            None
        }
    }
}
