//! Image processing — pure Rust, zero external dependencies.
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{VariantSize, variant_sizes};
pub use params::{Quality, RecompressParams, VariantParams};
pub use rust_backend::RustBackend;
