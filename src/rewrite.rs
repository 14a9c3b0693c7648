//! Content rewriting: WordPress HTML fragments → target-site markup.
//!
//! The transform is an ordered table of named rewrite rules, each a pure
//! text→text function, applied in sequence (see [`RULES`]). Every rule is
//! idempotent — it detects its own output and leaves it alone — so running
//! the full transform twice is byte-identical to running it once. That
//! property is what lets the pipeline re-run safely over an already
//! migrated store.
//!
//! Rule order matters:
//!
//! 1. `strip-block-comments` — drop `<!-- wp:* -->` structural markers.
//! 2. `resolve-figures` — figure blocks become embed placeholders (external
//!    URL, no image) or unwrap to their inner image markup.
//! 3. `rewrite-images` — per-`<img>` src rewriting by addressing mode, plus
//!    lazy-loading and max-width assertions.
//! 4. `resolve-video-embeds` — placeholders with a recognized video URL
//!    become a clickable thumbnail preview; the rest stay plain links.
//!
//! No I/O happens here; [`rewrite_store`] is the thin batch wrapper that
//! loads records, rewrites content fields in place, and saves.

use crate::store::{RecordStore, StoreError};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// How image URLs should be addressed after the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMode {
    /// Pre-migration: site-local paths gain the WordPress host prefix so
    /// images keep resolving while they still live on the old server.
    Absolute,
    /// Post-migration: WordPress-host URLs become site-relative paths.
    SiteRelative,
}

/// Options shared by every rule.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Origin WordPress host, no trailing slash (`https://web.example.com`).
    pub base_url: String,
    pub mode: UrlMode,
}

/// A named rewrite rule. Pure function of (fragment, options).
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&str, &RewriteOptions) -> String,
}

/// The transform pipeline, in application order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "strip-block-comments",
        apply: strip_block_comments,
    },
    Rule {
        name: "resolve-figures",
        apply: resolve_figures,
    },
    Rule {
        name: "rewrite-images",
        apply: rewrite_images,
    },
    Rule {
        name: "resolve-video-embeds",
        apply: resolve_video_embeds,
    },
];

/// Apply the full rule table to one HTML fragment.
pub fn rewrite_fragment(content: &str, opts: &RewriteOptions) -> String {
    RULES
        .iter()
        .fold(content.to_string(), |acc, rule| (rule.apply)(&acc, opts))
}

// ============================================================================
// Rule 1: block-editor comments
// ============================================================================

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*/?wp:(paragraph|heading|list-item|list|embed|image|figure)\b[^>]*-->")
        .unwrap()
});

/// Remove paired block-editor markers. They carry layout metadata for the
/// WordPress editor and render as nothing.
fn strip_block_comments(content: &str, _opts: &RewriteOptions) -> String {
    BLOCK_COMMENT.replace_all(content, "").into_owned()
}

// ============================================================================
// Rule 2: figures and embed placeholders
// ============================================================================

static FIGURE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<figure[^>]*>(.*?)</figure>").unwrap());

static FIRST_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"https?://[^\s<"']+"#).unwrap());

/// Figures carrying only an external URL (WordPress embed blocks) collapse
/// to an embed placeholder; figures wrapping an image lose the figure tags
/// but keep their inner markup.
fn resolve_figures(content: &str, _opts: &RewriteOptions) -> String {
    FIGURE_BLOCK
        .replace_all(content, |caps: &Captures| {
            let inner = &caps[1];
            if !inner.contains("<img")
                && let Some(url) = FIRST_URL.find(inner)
            {
                return embed_placeholder(url.as_str());
            }
            inner.to_string()
        })
        .into_owned()
}

fn embed_placeholder(url: &str) -> String {
    format!(
        "<div class=\"embed-container\">\
         <a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{url}</a>\
         </div>"
    )
}

// ============================================================================
// Rule 3: image src rewriting
// ============================================================================

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img([^>]*?)\s+src="([^"]*)"([^>]*?)>"#).unwrap());

/// Rewrite each `<img>` src for the addressing mode and assert lazy loading
/// and a max-width style. Attributes already present are left alone, which
/// keeps the rule idempotent.
fn rewrite_images(content: &str, opts: &RewriteOptions) -> String {
    IMG_TAG
        .replace_all(content, |caps: &Captures| {
            let before = &caps[1];
            let src = &caps[2];
            let after = &caps[3];

            if src.starts_with("data:") {
                return caps[0].to_string();
            }

            let new_src = rewrite_image_url(src, opts);

            // Preserve self-closing slash at the tag end.
            let (after, close) = match after.trim_end().strip_suffix('/') {
                Some(rest) => (rest.trim_end(), " />"),
                None => (after, ">"),
            };

            let mut tag = format!("<img{before} src=\"{new_src}\"{after}");
            let whole = &caps[0];
            if !whole.contains("loading=") {
                tag.push_str(" loading=\"lazy\"");
            }
            if !whole.contains("style=") {
                tag.push_str(" style=\"max-width: 100%; height: auto;\"");
            }
            tag.push_str(close);
            tag
        })
        .into_owned()
}

/// Addressing-mode conversion for one URL. Site-local and foreign URLs pass
/// through untouched except for the mode's own direction.
fn rewrite_image_url(src: &str, opts: &RewriteOptions) -> String {
    match opts.mode {
        UrlMode::Absolute => {
            if src.starts_with('/') {
                format!("{}{}", opts.base_url, src)
            } else {
                src.to_string()
            }
        }
        UrlMode::SiteRelative => match src.strip_prefix(opts.base_url.as_str()) {
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => src.to_string(),
        },
    }
}

// ============================================================================
// Rule 4: video embed previews
// ============================================================================

static EMBED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="embed-container"><a href="([^"]+)" target="_blank" rel="noopener noreferrer">[^<]*</a></div>"#,
    )
    .unwrap()
});

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?[^\s\x22]*\bv=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{6,})")
        .unwrap()
});

/// Embed placeholders whose URL matches a known video shape become a
/// thumbnail preview: link-wrapped poster frame with a play-icon overlay.
/// The high-resolution poster may not exist for older videos, so the image
/// falls back to the always-available `hqdefault` on load failure.
/// Unrecognized embed URLs stay as plain links.
fn resolve_video_embeds(content: &str, _opts: &RewriteOptions) -> String {
    EMBED_PLACEHOLDER
        .replace_all(content, |caps: &Captures| {
            let url = &caps[1];
            match extract_video_id(url) {
                Some(id) => video_preview(url, &id),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Video id from the known URL shapes: `watch?v=`, `youtu.be/`, `/embed/`.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .map(|caps| caps[1].to_string())
}

fn video_preview(url: &str, id: &str) -> String {
    format!(
        "<div class=\"video-embed\">\
         <a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">\
         <img src=\"https://img.youtube.com/vi/{id}/maxresdefault.jpg\" \
         alt=\"Video preview\" loading=\"lazy\" \
         style=\"max-width: 100%; height: auto;\" \
         onerror=\"this.onerror=null;this.src='https://img.youtube.com/vi/{id}/hqdefault.jpg'\">\
         <span class=\"video-embed-play\">&#9654;</span>\
         </a></div>"
    )
}

// ============================================================================
// Responsive markup upgrade
// ============================================================================

static UPGRADE_IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]*?\s+src="([^"]*)"[^>]*>"#).unwrap());

static ALT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\salt="([^"]*)""#).unwrap());

/// Replace plain site-local `<img>` tags with a `<picture>` block offering
/// AVIF and WebP sources across the breakpoint set, falling back to the
/// `-optimized` recompression of the original. Used once derived variants
/// exist on disk.
///
/// Already-upgraded images (src pointing at an `-optimized` file) and
/// non-raster or remote sources are left untouched.
pub fn upgrade_images(content: &str, breakpoints: &[u32]) -> String {
    UPGRADE_IMG
        .replace_all(content, |caps: &Captures| {
            let src = &caps[1];
            let Some((base, ext)) = upgradable_parts(src) else {
                return caps[0].to_string();
            };
            let alt = ALT_ATTR
                .captures(&caps[0])
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            picture_block(&base, &ext, &alt, breakpoints)
        })
        .into_owned()
}

/// Split a src into (base, extension) when it is a site-local raster
/// original; `None` when the rule must not touch it.
fn upgradable_parts(src: &str) -> Option<(String, String)> {
    if !src.starts_with('/') {
        return None;
    }
    let (base, ext) = src.rsplit_once('.')?;
    if !matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg") {
        return None;
    }
    if base.ends_with("-optimized") {
        return None; // already upgraded
    }
    Some((base.to_string(), ext.to_string()))
}

fn srcset(base: &str, format: &str, breakpoints: &[u32]) -> String {
    breakpoints
        .iter()
        .map(|w| format!("{base}-{w}w.{format} {w}w"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn picture_block(base: &str, ext: &str, alt: &str, breakpoints: &[u32]) -> String {
    let mime_ext = if ext.eq_ignore_ascii_case("jpg") {
        "jpeg"
    } else {
        ext
    };
    format!(
        "<picture>\
         <source type=\"image/avif\" srcset=\"{avif}\">\
         <source type=\"image/webp\" srcset=\"{webp}\">\
         <source type=\"image/{mime_ext}\" srcset=\"{orig}\">\
         <img src=\"{base}-optimized.{ext}\" alt=\"{alt}\" loading=\"lazy\" \
         decoding=\"async\" style=\"max-width: 100%; height: auto;\">\
         </picture>",
        avif = srcset(base, "avif", breakpoints),
        webp = srcset(base, "webp", breakpoints),
        orig = srcset(base, ext, breakpoints),
    )
}

// ============================================================================
// Batch application over the record store
// ============================================================================

/// Counts from one [`rewrite_store`] run.
#[derive(Debug, Default, PartialEq)]
pub struct RewriteSummary {
    pub posts_changed: usize,
    pub pages_changed: usize,
}

/// Load the store, rewrite post/page content and excerpts in place, save.
///
/// With `upgrade` set, plain images are additionally replaced by responsive
/// `<picture>` markup (requires derived variants on disk to be useful).
pub fn rewrite_store(
    store: &RecordStore,
    opts: &RewriteOptions,
    upgrade: bool,
    breakpoints: &[u32],
) -> Result<RewriteSummary, StoreError> {
    let transform = |fragment: &str| {
        let out = rewrite_fragment(fragment, opts);
        if upgrade {
            upgrade_images(&out, breakpoints)
        } else {
            out
        }
    };

    let mut summary = RewriteSummary::default();

    let mut posts = store.load_posts()?;
    for post in &mut posts {
        let content = transform(&post.content);
        let excerpt = transform(&post.excerpt);
        if content != post.content || excerpt != post.excerpt {
            post.content = content;
            post.excerpt = excerpt;
            summary.posts_changed += 1;
        }
    }
    store.save_posts(&posts)?;

    let mut pages = store.load_pages()?;
    for page in &mut pages {
        let content = transform(&page.content);
        if content != page.content {
            page.content = content;
            summary.pages_changed += 1;
        }
    }
    store.save_pages(&pages)?;

    Ok(summary)
}
