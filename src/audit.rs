//! Filesystem reconciliation: find images content no longer needs.
//!
//! Two independent read-mostly analyses over the image tree:
//!
//! - **Unused detection** — every image reference in the record store (post
//!   and page content, featured images, attachment URLs) and in any
//!   generated HTML is collected and normalized; files on disk that match
//!   no reference are reported with their total size.
//! - **Duplicate-derivation detection** — filenames with compounded variant
//!   suffixes (`-320w-640w`, `-optimized-optimized`, mixes of both) can
//!   only come from deriving over derived output; they are pure waste.
//!
//! Both analyses are read-then-act: the scan never mutates, and deletion is
//! a separate explicit call, so a dry-run report is always available.
//!
//! Path matching is a containment heuristic: a disk path and a reference
//! count as equivalent when either normalized form is a suffix of the
//! other. That absorbs the `public/` prefix and host-relative variation in
//! references, but it is approximate — an unrelated file sharing a
//! trailing path can be classified as used. The failure direction is
//! conservative (a deletable file is kept).

use crate::naming::{self, IMAGE_EXTENSIONS};
use crate::records::Attachment;
use crate::store::{RecordStore, StoreError};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// Reference extraction
// ============================================================================

static UPLOAD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)/wp-content/uploads/[^"'\s)>]+\.(?:png|jpe?g|gif|webp|avif)"#).unwrap()
});

static IMAGES_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)/images/[^"'\s)>]+\.(?:png|jpe?g|gif|webp|avif)"#).unwrap()
});

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+\.(?:png|jpe?g|gif|webp|avif))"#).unwrap()
});

/// Every image path/URL mentioned in an HTML fragment. Absolute URLs under
/// `base_url` are reduced to their site-relative form.
pub fn extract_image_refs(content: &str, base_url: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for m in UPLOAD_PATH.find_iter(content) {
        refs.push(m.as_str().to_string());
    }
    for m in IMAGES_PATH.find_iter(content) {
        refs.push(m.as_str().to_string());
    }
    for caps in IMG_SRC.captures_iter(content) {
        refs.push(strip_host(&caps[1], base_url));
    }

    refs
}

fn strip_host(url: &str, base_url: &str) -> String {
    match url.strip_prefix(base_url) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => url.to_string(),
    }
}

/// Strip leading slashes and unify separators, so `/a/b.jpg`,
/// `a/b.jpg` and `\a\b.jpg` all compare equal.
fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Containment heuristic: exact match, or either side a path suffix of the
/// other.
fn paths_equivalent(file: &str, reference: &str) -> bool {
    let file = normalize(file);
    let reference = normalize(reference);
    file == reference || file.ends_with(&reference) || reference.ends_with(&file)
}

fn attachment_refs(att: &Attachment, base_url: &str) -> Vec<String> {
    let mut refs = vec![strip_host(&att.url, base_url)];
    if let Some(sizes) = &att.sizes {
        refs.extend(sizes.values().map(|v| strip_host(&v.url, base_url)));
    }
    refs
}

/// Every image reference in the record store and (when present) the
/// generated HTML output.
pub fn collect_used_refs(
    store: &RecordStore,
    html_dir: &Path,
    base_url: &str,
) -> Result<HashSet<String>, AuditError> {
    let mut used: HashSet<String> = HashSet::new();

    for post in store.load_posts()? {
        used.extend(extract_image_refs(&post.content, base_url));
        used.extend(extract_image_refs(&post.excerpt, base_url));
        if let Some(url) = &post.featured_image_url {
            used.insert(strip_host(url, base_url));
        }
    }
    for page in store.load_pages()? {
        used.extend(extract_image_refs(&page.content, base_url));
    }
    for att in store.load_attachments()? {
        used.extend(attachment_refs(&att, base_url));
    }

    // A previous site build is another consumer of image paths.
    if html_dir.exists() {
        for entry in WalkDir::new(html_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|x| x == "html"))
        {
            let html = std::fs::read_to_string(entry.path())?;
            used.extend(extract_image_refs(&html, base_url));
        }
    }

    Ok(used)
}

// ============================================================================
// Unused detection
// ============================================================================

/// Result of the unused scan. Pure report — nothing was touched.
#[derive(Debug, Default)]
pub struct UnusedReport {
    /// Distinct references found in content.
    pub referenced: usize,
    /// Original image files examined on disk.
    pub scanned: usize,
    pub unused: Vec<PathBuf>,
    pub total_bytes: u64,
}

/// Original image files under the roots (derived variants excluded — a
/// variant must not count as a use of itself), sorted.
fn scan_image_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.exists())
        .flat_map(|root| {
            WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
        })
        .filter(|path| naming::has_extension(path, IMAGE_EXTENSIONS))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !naming::is_derived_variant(n))
        })
        .collect();
    files.sort();
    files
}

/// Reconcile disk files against content references.
pub fn find_unused(
    store: &RecordStore,
    roots: &[PathBuf],
    html_dir: &Path,
    base_url: &str,
) -> Result<UnusedReport, AuditError> {
    let used = collect_used_refs(store, html_dir, base_url)?;
    let files = scan_image_files(roots);

    let mut report = UnusedReport {
        referenced: used.len(),
        scanned: files.len(),
        ..UnusedReport::default()
    };

    for file in files {
        let file_str = file.to_string_lossy();
        let is_used = used.iter().any(|r| paths_equivalent(&file_str, r));
        if !is_used {
            report.total_bytes += std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
            report.unused.push(file);
        }
    }

    Ok(report)
}

// ============================================================================
// Duplicate-derivation detection
// ============================================================================

/// Files whose names carry compounded variant suffixes, sorted.
pub fn find_duplicate_derived(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.exists())
        .flat_map(|root| {
            WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
        })
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(naming::is_compound_variant)
        })
        .collect();
    files.sort();
    files
}

// ============================================================================
// Deletion — the explicit destructive phase
// ============================================================================

#[derive(Debug, Default, PartialEq)]
pub struct DeleteOutcome {
    pub deleted: usize,
    /// (path, error) for files that could not be removed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Remove the given files. Failures are collected, not fatal.
pub fn delete_files(files: &[PathBuf]) -> DeleteOutcome {
    let mut outcome = DeleteOutcome::default();
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => outcome.deleted += 1,
            Err(e) => outcome.failed.push((file.clone(), e.to_string())),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Page, Post, SizeVariant};
    use std::fs;
    use tempfile::TempDir;

    const BASE: &str = "https://web.example.com";

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "img-bytes").unwrap();
    }

    // =========================================================================
    // Reference extraction and path equivalence
    // =========================================================================

    #[test]
    fn refs_found_in_plain_paths_and_img_tags() {
        let content = concat!(
            r#"<p>see /wp-content/uploads/2024/a.jpg and /images/logo.png</p>"#,
            r#"<img src="https://web.example.com/wp-content/uploads/2024/b.jpeg">"#,
        );
        let refs = extract_image_refs(content, BASE);
        assert!(refs.contains(&"/wp-content/uploads/2024/a.jpg".to_string()));
        assert!(refs.contains(&"/images/logo.png".to_string()));
        // Host stripped from the absolute URL.
        assert!(refs.contains(&"/wp-content/uploads/2024/b.jpeg".to_string()));
    }

    #[test]
    fn equivalence_ignores_leading_slash_and_prefix_dirs() {
        assert!(paths_equivalent(
            "public/wp-content/uploads/2024/a.jpg",
            "/wp-content/uploads/2024/a.jpg"
        ));
        assert!(paths_equivalent("a/b.jpg", "a/b.jpg"));
        assert!(!paths_equivalent("public/images/x.png", "/images/y.png"));
    }

    // =========================================================================
    // Unused reconciliation
    // =========================================================================

    /// Store referencing only `a.jpg`, tree containing `a.jpg` and `b.jpg`.
    fn unused_fixture(content: &str) -> (TempDir, RecordStore) {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(tmp.path().join("data"));
        store
            .save_posts(&[Post {
                id: 1,
                content: content.to_string(),
                ..Post::default()
            }])
            .unwrap();
        touch(&tmp.path().join("public/wp-content/uploads/2024/a.jpg"));
        touch(&tmp.path().join("public/wp-content/uploads/2024/b.jpg"));
        (tmp, store)
    }

    #[test]
    fn unreferenced_file_reported_with_size() {
        let (tmp, store) =
            unused_fixture(r#"<img src="/wp-content/uploads/2024/a.jpg">"#);
        let roots = vec![tmp.path().join("public")];

        let report = find_unused(&store, &roots, &tmp.path().join("out"), BASE).unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.unused.len(), 1);
        assert!(report.unused[0].ends_with("2024/b.jpg"));
        assert_eq!(report.total_bytes, "img-bytes".len() as u64);
    }

    #[test]
    fn host_prefixed_reference_still_counts_as_used() {
        let (tmp, store) = unused_fixture(
            r#"<img src="https://web.example.com/wp-content/uploads/2024/a.jpg">"#,
        );
        let roots = vec![tmp.path().join("public")];

        let report = find_unused(&store, &roots, &tmp.path().join("out"), BASE).unwrap();
        let unused: Vec<String> = report
            .unused
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert!(unused.iter().all(|p| !p.ends_with("a.jpg")), "{unused:?}");
    }

    #[test]
    fn attachment_size_urls_count_as_uses() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(tmp.path().join("data"));
        let mut sizes = std::collections::BTreeMap::new();
        sizes.insert(
            "medium".to_string(),
            SizeVariant {
                url: format!("{BASE}/wp-content/uploads/2024/c-300x200.jpg"),
            },
        );
        store
            .save_attachments(&[crate::records::Attachment {
                id: 1,
                url: format!("{BASE}/wp-content/uploads/2024/c.jpg"),
                sizes: Some(sizes),
                ..crate::records::Attachment::default()
            }])
            .unwrap();
        touch(&tmp.path().join("public/wp-content/uploads/2024/c.jpg"));
        touch(&tmp.path().join("public/wp-content/uploads/2024/c-300x200.jpg"));

        let report = find_unused(
            &store,
            &[tmp.path().join("public")],
            &tmp.path().join("out"),
            BASE,
        )
        .unwrap();
        assert!(report.unused.is_empty());
    }

    #[test]
    fn generated_html_counts_as_use() {
        let (tmp, store) = unused_fixture("<p>no images in content</p>");
        fs::create_dir_all(tmp.path().join("out")).unwrap();
        fs::write(
            tmp.path().join("out/index.html"),
            r#"<img src="/wp-content/uploads/2024/b.jpg">"#,
        )
        .unwrap();

        let report = find_unused(
            &store,
            &[tmp.path().join("public")],
            &tmp.path().join("out"),
            BASE,
        )
        .unwrap();
        let unused: Vec<String> = report
            .unused
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert!(unused.iter().all(|p| !p.ends_with("b.jpg")), "{unused:?}");
    }

    #[test]
    fn page_content_counts_as_use() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(tmp.path().join("data"));
        store
            .save_pages(&[Page {
                id: 1,
                content: r#"<img src="/wp-content/uploads/access-map.png">"#.to_string(),
                ..Page::default()
            }])
            .unwrap();
        touch(&tmp.path().join("public/wp-content/uploads/access-map.png"));

        let report = find_unused(
            &store,
            &[tmp.path().join("public")],
            &tmp.path().join("out"),
            BASE,
        )
        .unwrap();
        assert!(report.unused.is_empty());
    }

    #[test]
    fn derived_variants_are_not_scanned() {
        let (tmp, store) =
            unused_fixture(r#"<img src="/wp-content/uploads/2024/a.jpg">"#);
        // Variants of a.jpg: excluded from the scan entirely.
        touch(&tmp.path().join("public/wp-content/uploads/2024/a-320w.webp"));
        touch(&tmp.path().join("public/wp-content/uploads/2024/a-optimized.jpg"));

        let report = find_unused(
            &store,
            &[tmp.path().join("public")],
            &tmp.path().join("out"),
            BASE,
        )
        .unwrap();
        assert_eq!(report.scanned, 2); // just a.jpg and b.jpg
    }

    #[test]
    fn find_unused_does_not_delete_anything() {
        let (tmp, store) =
            unused_fixture(r#"<img src="/wp-content/uploads/2024/a.jpg">"#);
        let b = tmp.path().join("public/wp-content/uploads/2024/b.jpg");

        find_unused(&store, &[tmp.path().join("public")], &tmp.path().join("out"), BASE).unwrap();
        assert!(b.exists());
    }

    // =========================================================================
    // Duplicates
    // =========================================================================

    #[test]
    fn duplicate_scan_flags_only_compounded_names() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("up/photo-320w-640w.jpg"));
        touch(&tmp.path().join("up/photo-optimized-optimized.png"));
        touch(&tmp.path().join("up/photo-640w.jpg"));
        touch(&tmp.path().join("up/photo.jpg"));

        let dupes = find_duplicate_derived(&[tmp.path().to_path_buf()]);
        let names: Vec<String> = dupes
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "photo-320w-640w.jpg".to_string(),
                "photo-optimized-optimized.png".to_string(),
            ]
        );
    }

    #[test]
    fn delete_removes_reported_files() {
        let tmp = TempDir::new().unwrap();
        let dupe = tmp.path().join("photo-320w-320w.jpg");
        touch(&dupe);

        let outcome = delete_files(&[dupe.clone()]);
        assert_eq!(outcome.deleted, 1);
        assert!(outcome.failed.is_empty());
        assert!(!dupe.exists());
    }

    #[test]
    fn delete_collects_failures() {
        let outcome = delete_files(&[PathBuf::from("/definitely/not/here.jpg")]);
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.failed.len(), 1);
    }
}
