//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the deriver
//! needs: identify, variant (resize + re-encode), and recompress. The
//! production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, all
//! codecs statically linked. Tests use the recording `MockBackend` below.

use super::params::{RecompressParams, VariantParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// The larger of the two edges — breakpoints are measured against this.
    pub fn longer_edge(self) -> u32 {
        self.width.max(self.height)
    }
}

/// Trait for image processing backends.
///
/// Must be `Sync`: the deriver fans out over files with rayon and shares
/// one backend across workers.
pub trait ImageBackend: Sync {
    /// Read image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce one resized variant, format chosen by the output extension.
    fn variant(&self, params: &VariantParams) -> Result<(), BackendError>;

    /// Re-encode the original at full size in its own format.
    fn recompress(&self, params: &RecompressParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Variant {
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
        Recompress {
            output: String,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Results are popped, so push them in reverse call order.
        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn variant(&self, params: &VariantParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Variant {
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }

        fn recompress(&self, params: &RecompressParams) -> Result<(), BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Recompress {
                    output: params.output.to_string_lossy().to_string(),
                    quality: params.quality.value(),
                });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let dims = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(dims.width, 800);
        assert_eq!(dims.longer_edge(), 800);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_variant() {
        use crate::imaging::params::Quality;

        let backend = MockBackend::new();
        backend
            .variant(&VariantParams {
                source: "/source.jpg".into(),
                output: "/source-320w.webp".into(),
                width: 320,
                height: 240,
                quality: Quality::new(80),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Variant {
                width: 320,
                height: 240,
                quality: 80,
                ..
            }
        ));
    }
}
