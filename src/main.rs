use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stillpress::imaging::{Quality, RustBackend};
use stillpress::store::RecordStore;
use stillpress::{audit, config, derive, import, migrate, output, records, rewrite};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "stillpress")]
#[command(about = "WordPress export → static blog content pipeline")]
#[command(long_about = "\
WordPress export → static blog content pipeline

Each subcommand is an independent batch step over the record store
(data/*.json) and the public image tree. Typical one-time migration:

  stillpress import-from-export export.xml    # XML → JSON records
  stillpress migrate-images                   # download media, localize URLs
  stillpress rewrite-content                  # normalize stored HTML
  stillpress derive-images                    # responsive variants
  stillpress sync-record-store-to-public      # publish the records

Housekeeping, safe to run any time:

  stillpress find-unused-images [--delete]
  stillpress find-duplicate-derived-images [--delete]

Exit code is non-zero only for fatal errors (malformed export, corrupt
record store). Per-file failures during derivation or download are
reported in the summary and do not fail the command.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./stillpress.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a WordPress export document into the record store
    ImportFromExport {
        /// Path to the WXR export file
        export: PathBuf,
    },
    /// Download WordPress-hosted media and relocalize record URLs
    MigrateImages,
    /// Apply the content rewrite pipeline to stored posts and pages
    RewriteContent {
        /// Replace plain images with responsive <picture> markup
        #[arg(long)]
        upgrade_images: bool,
        /// Rewrite toward absolute origin-host URLs instead of
        /// site-relative paths
        #[arg(long)]
        absolute: bool,
    },
    /// Generate responsive variants for every original image
    DeriveImages,
    /// Report images never referenced by content
    FindUnusedImages {
        /// Actually delete the unused files after reporting
        #[arg(long)]
        delete: bool,
    },
    /// Report compounded-suffix byproducts of re-derivation
    FindDuplicateDerivedImages {
        /// Actually delete the duplicates after reporting
        #[arg(long)]
        delete: bool,
    },
    /// Copy the record store JSON into the public directory
    SyncRecordStoreToPublic,
    /// Print the next free post id
    NextId,
    /// Insert a template post with the next free id
    NewPost {
        /// Title for the template post
        #[arg(long)]
        title: Option<String>,
        /// Insert a finished post from a JSON file instead of a template
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Print a stock stillpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::SiteConfig::load(cli.config.as_deref())?;
    let store = RecordStore::new(&config.store.data_dir);

    match cli.command {
        Command::ImportFromExport { export } => {
            let data = import::import(&export, &store)?;
            output::print_lines(&output::format_import_summary(&data));
        }
        Command::MigrateImages => {
            let fetcher = migrate::HttpFetcher::new()?;
            let summary = migrate::migrate_images(
                &store,
                &fetcher,
                &config.site.base_url,
                &config.store.public_dir,
            )?;
            output::print_lines(&output::format_migrate_summary(&summary));
        }
        Command::RewriteContent {
            upgrade_images,
            absolute,
        } => {
            let opts = rewrite::RewriteOptions {
                base_url: config.site.base_url.clone(),
                mode: if absolute {
                    rewrite::UrlMode::Absolute
                } else {
                    rewrite::UrlMode::SiteRelative
                },
            };
            let summary = rewrite::rewrite_store(
                &store,
                &opts,
                upgrade_images,
                &config.images.breakpoints,
            )?;
            output::print_lines(&output::format_rewrite_summary(&summary));
        }
        Command::DeriveImages => {
            let backend = RustBackend::new();
            let derive_config = derive::DeriveConfig {
                breakpoints: config.images.breakpoints.clone(),
                quality: Quality::new(config.images.quality),
            };
            let summary =
                derive::derive_images(&backend, &config.image_roots(), &derive_config);
            output::print_lines(&output::format_derive_summary(&summary));
        }
        Command::FindUnusedImages { delete } => {
            let report = audit::find_unused(
                &store,
                &config.image_roots(),
                &config.audit.html_dir,
                &config.site.base_url,
            )?;
            output::print_lines(&output::format_unused_report(&report));
            if delete && !report.unused.is_empty() {
                let outcome = audit::delete_files(&report.unused);
                output::print_lines(&output::format_delete_outcome(&outcome));
            }
        }
        Command::FindDuplicateDerivedImages { delete } => {
            let duplicates = audit::find_duplicate_derived(&config.image_roots());
            output::print_lines(&output::format_duplicate_report(&duplicates));
            if delete && !duplicates.is_empty() {
                let outcome = audit::delete_files(&duplicates);
                output::print_lines(&output::format_delete_outcome(&outcome));
            }
        }
        Command::SyncRecordStoreToPublic => {
            let synced = store.sync_to(&config.store.public_dir)?;
            println!(
                "Synced {} to {}",
                synced.join(", "),
                config.store.public_dir.display()
            );
        }
        Command::NextId => {
            println!("{}", store.next_post_id()?);
        }
        Command::NewPost { title, from } => {
            let post = match from {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)?;
                    serde_json::from_str(&json)?
                }
                None => template_post(&store, title.as_deref())?,
            };
            let id = post.id;
            let post_title = post.title.clone();
            store.prepend_post(post)?;
            println!("Added post {id}: \"{post_title}\"");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An empty post shell with the next free id and the current timestamp.
fn template_post(
    store: &RecordStore,
    title: Option<&str>,
) -> Result<records::Post, Box<dyn std::error::Error>> {
    let id = store.next_post_id()?;
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    Ok(records::Post {
        id,
        title: title.unwrap_or("Untitled post").to_string(),
        content: "<p></p>".to_string(),
        date: now.clone(),
        modified: now,
        slug: format!("post-{id}"),
        status: "publish".to_string(),
        ..records::Post::default()
    })
}
