//! Site configuration: `stillpress.toml`.
//!
//! Every knob has a documented default, so the pipeline runs without a
//! config file at all — the file only overrides. `gen-config` prints a
//! fully documented template (rendered by confique from the field docs
//! below).

use confique::Config;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config filename looked up in the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "stillpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] confique::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Config)]
pub struct SiteConfig {
    #[config(nested)]
    pub site: SiteSection,
    #[config(nested)]
    pub store: StoreSection,
    #[config(nested)]
    pub images: ImagesSection,
    #[config(nested)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Config)]
pub struct SiteSection {
    /// Origin WordPress host the export came from, without a trailing
    /// slash. URLs under this host are the ones migration relocalizes.
    #[config(default = "https://web.fujimura.com")]
    pub base_url: String,
}

#[derive(Debug, Clone, Config)]
pub struct StoreSection {
    /// Directory holding posts.json / pages.json / attachments.json.
    #[config(default = "data")]
    pub data_dir: PathBuf,

    /// Web root: downloaded media land here, and `sync-record-store-to-public`
    /// copies the record files here.
    #[config(default = "public")]
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Config)]
pub struct ImagesSection {
    /// Responsive breakpoint widths (longer edge), ascending.
    #[config(default = [320, 640, 960, 1280, 1920])]
    pub breakpoints: Vec<u32>,

    /// Lossy encoding quality (1-100) for derived variants.
    #[config(default = 80)]
    pub quality: u32,

    /// Directories scanned for original images, relative to the working
    /// directory.
    #[config(default = ["public/images", "public/wp-content/uploads"])]
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, Config)]
pub struct AuditSection {
    /// A previous static build to include when collecting image
    /// references (skipped when absent).
    #[config(default = "out")]
    pub html_dir: PathBuf,
}

impl SiteConfig {
    /// Load from an explicit file, or from `stillpress.toml` if present,
    /// or defaults alone.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        match path {
            Some(p) => builder = builder.file(p),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.file(DEFAULT_CONFIG_FILE);
            }
            None => {}
        }
        let mut config = builder.load()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// The image roots as paths.
    pub fn image_roots(&self) -> Vec<PathBuf> {
        self.images.roots.iter().map(PathBuf::from).collect()
    }

    fn normalize(&mut self) {
        while self.site.base_url.ends_with('/') {
            self.site.base_url.pop();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.is_empty() {
            return Err(ConfigError::Invalid("site.base_url is empty".to_string()));
        }
        if self.images.breakpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "images.breakpoints must not be empty".to_string(),
            ));
        }
        if !self.images.breakpoints.is_sorted() {
            return Err(ConfigError::Invalid(
                "images.breakpoints must be ascending".to_string(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Invalid(format!(
                "images.quality must be 1-100, got {}",
                self.images.quality
            )));
        }
        Ok(())
    }
}

/// Documented stock config, suitable for writing to `stillpress.toml`.
pub fn stock_config_toml() -> String {
    confique::toml::template::<SiteConfig>(confique::toml::FormatOptions::default())
}
