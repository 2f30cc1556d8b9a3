//! blog-rs: a small static generator for a personal markdown blog
//!
//! Posts live as markdown files with front-matter in a single directory.
//! The generator renders a home page listing every post, one page per post
//! and a 404 page; the preview server adds a tiny JSON API.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod routes;
pub mod server;
pub mod templates;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Name of the site configuration file in the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding one markdown file per post
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
        })
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    /// Fail unless the public directory can be deleted without touching
    /// the site sources.
    ///
    /// Paths are compared after resolving `..` and symlinks, so
    /// `public_dir: posts/..` is caught as well as `public_dir: .`.
    pub fn ensure_public_dir_is_disposable(&self) -> Result<()> {
        // Nothing to delete yet, and a missing directory cannot hold the sources
        let Ok(public_dir) = self.public_dir.canonicalize() else {
            return Ok(());
        };

        for source in [&self.base_dir, &self.posts_dir] {
            if let Ok(source) = source.canonicalize() {
                if source.starts_with(&public_dir) {
                    bail!(
                        "Refusing to use {:?} as output: it contains the site sources",
                        self.public_dir
                    );
                }
            }
        }

        Ok(())
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, id: Option<&str>) -> Result<PathBuf> {
        commands::new::create_post(self, title, id)
    }
}
