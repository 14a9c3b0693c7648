//! # stillpress
//!
//! A batch pipeline that turns a one-time WordPress export into the content
//! backing a static blog. The export is parsed once into plain JSON record
//! files; every later stage reads and rewrites those records or the image
//! tree next to them.
//!
//! # Architecture: Independent Batch Stages Over a Record Store
//!
//! ```text
//! 1. Import    export.xml  →  data/{posts,pages,attachments}.json
//! 2. Migrate   remote media → public/ tree, record URLs relocalized
//! 3. Rewrite   record HTML fragments normalized for the target site
//! 4. Derive    originals    →  (format × breakpoint) responsive variants
//! 5. Audit     image tree reconciled against content references
//! ```
//!
//! Every stage is independently re-runnable: the importer rebuilds its
//! collections from the source export, the rewriter is idempotent, the
//! deriver skips up-to-date outputs, and the auditor separates reporting
//! from deletion. There is no shared process state — the record store on
//! disk is the only hand-off between commands.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`import`] | WXR export → posts/pages/attachments collections |
//! | [`migrate`] | Downloads WordPress-hosted media, relocalizes record URLs |
//! | [`rewrite`] | Ordered pipeline of idempotent HTML rewrite rules |
//! | [`derive`] | Responsive variant derivation over the image tree |
//! | [`audit`] | Unused-image and duplicate-derivation reconciliation |
//! | [`store`] | The JSON record files; load-at-start, save-at-end |
//! | [`records`] | Post / Page / Attachment types, camelCase JSON shape |
//! | [`naming`] | `<base>-<width>w.<format>` variant filename convention |
//! | [`imaging`] | Backend trait + pure-Rust codecs + dimension math |
//! | [`config`] | `stillpress.toml` loading with documented defaults |
//! | [`output`] | CLI summary formatting — pure `format_*` functions |
//!
//! # Design Decisions
//!
//! ## JSON Records As The Interface
//!
//! The record files are the contract with the site front-end: plain
//! arrays, camelCase fields, importer sort order. Downstream readers may
//! slice the first N records, so order is a guarantee, not an accident of
//! serialization.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate's decoders and encoders
//! (rav1e for AVIF) — no ImageMagick, no system dependencies. The binary
//! is self-contained, which matters for a pipeline that is run rarely and
//! must still work years later.
//!
//! ## Idempotence Over Bookkeeping
//!
//! No stage keeps a database of what it already did. The rewriter detects
//! its own output, the deriver compares file mtimes, the migrator skips
//! files already on disk. Interrupt anything, run it again, and it
//! finishes the remainder.

pub mod audit;
pub mod config;
pub mod derive;
pub mod imaging;
pub mod import;
pub mod migrate;
pub mod naming;
pub mod output;
pub mod records;
pub mod rewrite;
pub mod store;
