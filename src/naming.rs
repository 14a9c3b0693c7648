//! Derived-variant filename convention, shared by the deriver and auditor.
//!
//! Every derived file sits next to its original and is named by suffix:
//!
//! ```text
//! photo.jpg                # original — the only derivation source
//! photo-320w.webp          # <base>-<width>w.<format>
//! photo-1920w.avif
//! photo-optimized.jpg      # full-size recompression, original format
//! ```
//!
//! The convention is also a guard: anything already carrying a width or
//! `-optimized` suffix is never used as a derivation source. Re-deriving a
//! variant compounds the suffix (`photo-320w-640w.jpg`), which is exactly
//! what the auditor's duplicate scan hunts for.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Raster extensions the deriver accepts as source material.
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions that count as images for the unused scan (wider than the
/// derivation sources — gif/webp/avif files can be referenced by content).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif"];

static WIDTH_VARIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-\d+w\.(png|jpe?g|webp|avif)$").unwrap());

static OPTIMIZED_VARIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-optimized\.(png|jpe?g)$").unwrap());

static COMPOUND_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)-\d+w-\d+w|-optimized-optimized|-optimized-\d+w|-\d+w-optimized").unwrap()
});

/// `photo`, 320, `webp` → `photo-320w.webp`
pub fn variant_name(stem: &str, width: u32, format: &str) -> String {
    format!("{stem}-{width}w.{format}")
}

/// `photo`, `jpg` → `photo-optimized.jpg`
pub fn optimized_name(stem: &str, ext: &str) -> String {
    format!("{stem}-optimized.{ext}")
}

/// True for any filename produced by the deriver.
pub fn is_derived_variant(filename: &str) -> bool {
    WIDTH_VARIANT.is_match(filename) || OPTIMIZED_VARIANT.is_match(filename)
}

/// True for filenames with compounded derivation suffixes — the byproduct
/// of a deriver run over its own output.
pub fn is_compound_variant(filename: &str) -> bool {
    COMPOUND_SUFFIX.is_match(filename)
}

/// True when `path` has one of the given extensions (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_follow_convention() {
        assert_eq!(variant_name("photo", 320, "webp"), "photo-320w.webp");
        assert_eq!(optimized_name("photo", "jpg"), "photo-optimized.jpg");
    }

    #[test]
    fn derived_variants_are_recognized() {
        assert!(is_derived_variant("photo-320w.webp"));
        assert!(is_derived_variant("photo-1920w.avif"));
        assert!(is_derived_variant("photo-640w.JPG"));
        assert!(is_derived_variant("photo-optimized.png"));
    }

    #[test]
    fn originals_are_not_derived_variants() {
        assert!(!is_derived_variant("photo.jpg"));
        assert!(!is_derived_variant("photo-2024.jpg")); // no trailing `w`
        assert!(!is_derived_variant("width-chart.png"));
    }

    #[test]
    fn compound_suffixes_are_recognized() {
        assert!(is_compound_variant("photo-320w-640w.jpg"));
        assert!(is_compound_variant("photo-optimized-optimized.png"));
        assert!(is_compound_variant("photo-optimized-320w.webp"));
        assert!(is_compound_variant("photo-1280w-optimized.jpg"));
    }

    #[test]
    fn clean_variant_is_not_compound() {
        assert!(!is_compound_variant("photo-640w.jpg"));
        assert!(!is_compound_variant("photo-optimized.jpg"));
        assert!(!is_compound_variant("photo.jpg"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_extension(Path::new("a/b/PHOTO.JPG"), SOURCE_EXTENSIONS));
        assert!(!has_extension(Path::new("a/b/photo.gif"), SOURCE_EXTENSIONS));
        assert!(has_extension(Path::new("a/b/photo.gif"), IMAGE_EXTENSIONS));
        assert!(!has_extension(Path::new("noext"), IMAGE_EXTENSIONS));
    }
}
