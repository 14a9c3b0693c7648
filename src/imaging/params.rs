//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`derive`](crate::derive) stage (which decides
//! which variants to produce) and the [`backend`](super::backend) (which
//! does the pixel work). The separation lets tests swap in a recording
//! mock without touching derivation logic.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Full specification for one resized, re-encoded variant.
///
/// The output format is carried by the `output` path's extension — the
/// deriver builds paths through [`naming`](crate::naming), so the
/// extension is always one of webp/avif/png/jpg.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Target dimensions, aspect already resolved by the caller.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Full-size recompression of an original in its own format.
#[derive(Debug, Clone, PartialEq)]
pub struct RecompressParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
}
