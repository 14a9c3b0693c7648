//! The record store: on-disk JSON collections shared by every pipeline stage.
//!
//! Three files live in the data directory:
//!
//! ```text
//! data/
//! ├── posts.json          # Vec<Post>, importer sort order
//! ├── pages.json          # Vec<Page>
//! └── attachments.json    # Vec<Attachment>
//! ```
//!
//! Array order is a semantic guarantee — a reader that only needs the first
//! N posts may slice the array. Stages follow a load-at-start / save-at-end
//! discipline; the store is passed in rather than reached through module
//! state so each stage can be tested against a temp directory.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a crashed run never leaves a half-written collection behind.
//!
//! Corrupt JSON is fatal. A *missing* file reads as an empty collection —
//! the audit and utility commands run meaningfully before a first import.

use crate::records::{Attachment, Page, Post};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const POSTS_FILE: &str = "posts.json";
pub const PAGES_FILE: &str = "pages.json";
pub const ATTACHMENTS_FILE: &str = "attachments.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Corrupt record store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Post id {0} already exists")]
    DuplicateId(u32),
}

/// Handle on a record-store data directory.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn load_posts(&self) -> Result<Vec<Post>, StoreError> {
        self.read_collection(POSTS_FILE)
    }

    pub fn load_pages(&self) -> Result<Vec<Page>, StoreError> {
        self.read_collection(PAGES_FILE)
    }

    pub fn load_attachments(&self) -> Result<Vec<Attachment>, StoreError> {
        self.read_collection(ATTACHMENTS_FILE)
    }

    pub fn save_posts(&self, posts: &[Post]) -> Result<(), StoreError> {
        self.write_collection(POSTS_FILE, posts)
    }

    pub fn save_pages(&self, pages: &[Page]) -> Result<(), StoreError> {
        self.write_collection(PAGES_FILE, pages)
    }

    pub fn save_attachments(&self, attachments: &[Attachment]) -> Result<(), StoreError> {
        self.write_collection(ATTACHMENTS_FILE, attachments)
    }

    /// Next free post id: max existing id + 1, or 1 for an empty store.
    pub fn next_post_id(&self) -> Result<u32, StoreError> {
        let posts = self.load_posts()?;
        Ok(posts.iter().map(|p| p.id).max().unwrap_or(0) + 1)
    }

    /// Insert a post at the front of the collection (newest-first order).
    ///
    /// Rejects ids already present — collection ids must stay unique.
    pub fn prepend_post(&self, post: Post) -> Result<(), StoreError> {
        let mut posts = self.load_posts()?;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(StoreError::DuplicateId(post.id));
        }
        posts.insert(0, post);
        self.save_posts(&posts)
    }

    /// Copy the record files into `public_dir` for client-side consumption.
    ///
    /// Returns the filenames copied. Files that don't exist yet are skipped;
    /// an entirely empty store is an error (nothing to sync means the import
    /// never ran).
    pub fn sync_to(&self, public_dir: &Path) -> Result<Vec<String>, StoreError> {
        std::fs::create_dir_all(public_dir)?;
        let mut synced = Vec::new();
        for name in [POSTS_FILE, PAGES_FILE, ATTACHMENTS_FILE] {
            let src = self.data_dir.join(name);
            if src.exists() {
                std::fs::copy(&src, public_dir.join(name))?;
                synced.push(name.to_string());
            }
        }
        if synced.is_empty() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no record files in {}", self.data_dir.display()),
            )));
        }
        Ok(synced)
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StoreError> {
        let path = self.data_dir.join(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Write via temp file + rename so readers never observe a partial file.
    fn write_collection<T: Serialize>(&self, name: &str, records: &[T]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!(".{name}.tmp"));
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
