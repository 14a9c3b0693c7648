//! Responsive variant derivation over the image tree.
//!
//! For every original raster file under the configured roots, produce:
//!
//! ```text
//! photo.jpg
//! ├── photo-320w.webp   photo-320w.avif   photo-320w.jpg
//! ├── photo-640w.webp   photo-640w.avif   photo-640w.jpg
//! ├── ...                                  (breakpoints ≤ longer edge)
//! └── photo-optimized.jpg                  (full-size recompression)
//! ```
//!
//! The stage is incremental and interruptible: an output that already
//! exists and is at least as new as its source is skipped, so a re-run
//! after an interruption only does the remaining work.
//!
//! Discovery never picks up files that already carry a variant suffix —
//! deriving from a derived file would compound the suffix
//! (`photo-320w-640w.jpg`), which the auditor treats as damage.
//!
//! Files are processed in parallel with rayon. A failure on one file
//! (decode error, I/O error) is recorded with its path and does not stop
//! the batch; the summary carries the final counts.

use crate::imaging::{
    BackendError, ImageBackend, Quality, RecompressParams, VariantParams, variant_sizes,
};
use crate::naming::{self, SOURCE_EXTENSIONS};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Derivation knobs, fixed for a whole run.
#[derive(Debug, Clone)]
pub struct DeriveConfig {
    /// Target widths for the longer edge, ascending.
    pub breakpoints: Vec<u32>,
    pub quality: Quality,
}

/// Outcome of one derivation run.
#[derive(Debug, Default)]
pub struct DeriveSummary {
    /// Original files considered.
    pub sources: usize,
    /// Outputs actually encoded.
    pub generated: usize,
    /// Outputs skipped because they were already up to date.
    pub skipped: usize,
    /// Per-file failures, with the source path for context.
    pub failures: Vec<(PathBuf, String)>,
}

/// Derive variants for every original under `roots`. Missing roots are
/// skipped — the directory layout varies between checkouts.
pub fn derive_images(
    backend: &impl ImageBackend,
    roots: &[PathBuf],
    config: &DeriveConfig,
) -> DeriveSummary {
    let sources = discover_sources(roots);

    let outcomes: Vec<(PathBuf, Result<FileOutcome, BackendError>)> = sources
        .par_iter()
        .map(|path| (path.clone(), derive_one(backend, path, config)))
        .collect();

    let mut summary = DeriveSummary {
        sources: sources.len(),
        ..DeriveSummary::default()
    };
    for (path, outcome) in outcomes {
        match outcome {
            Ok(o) => {
                summary.generated += o.generated;
                summary.skipped += o.skipped;
            }
            Err(e) => summary.failures.push((path, e.to_string())),
        }
    }
    summary
}

/// Original raster files under the roots, variant-named files excluded,
/// sorted for deterministic processing order.
pub fn discover_sources(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.exists())
        .flat_map(|root| {
            WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
        })
        .filter(|path| naming::has_extension(path, SOURCE_EXTENSIONS))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !naming::is_derived_variant(n))
        })
        .collect();
    sources.sort();
    sources
}

#[derive(Debug, Default)]
struct FileOutcome {
    generated: usize,
    skipped: usize,
}

/// All variants plus the optimized recompression for one source file.
fn derive_one(
    backend: &impl ImageBackend,
    source: &Path,
    config: &DeriveConfig,
) -> Result<FileOutcome, BackendError> {
    let dims = backend.identify(source)?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unusable filename: {}", source.display()))
        })?;
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let dir = source.parent().unwrap_or_else(|| Path::new(""));

    let mut outcome = FileOutcome::default();

    for size in variant_sizes(dims, &config.breakpoints) {
        for format in ["webp", "avif", ext.as_str()] {
            let output = dir.join(naming::variant_name(stem, size.target, format));
            if up_to_date(source, &output) {
                outcome.skipped += 1;
                continue;
            }
            backend.variant(&VariantParams {
                source: source.to_path_buf(),
                output,
                width: size.width,
                height: size.height,
                quality: config.quality,
            })?;
            outcome.generated += 1;
        }
    }

    let optimized = dir.join(naming::optimized_name(stem, &ext));
    if up_to_date(source, &optimized) {
        outcome.skipped += 1;
    } else {
        backend.recompress(&RecompressParams {
            source: source.to_path_buf(),
            output: optimized,
            quality: config.quality,
        })?;
        outcome.generated += 1;
    }

    Ok(outcome)
}

/// Output exists and is at least as new as the source.
fn up_to_date(source: &Path, output: &Path) -> bool {
    let (Ok(src), Ok(out)) = (std::fs::metadata(source), std::fs::metadata(output)) else {
        return false;
    };
    match (src.modified(), out.modified()) {
        (Ok(s), Ok(o)) => o >= s,
        _ => false,
    }
}
