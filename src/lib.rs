//! updates-rs: markdown-authored updates served as a filterable, paginated API
//!
//! Updates are markdown files with a small `key: value` front-matter block.
//! They are parsed into [`content::PostMeta`] records, collected into a
//! [`content::ContentIndex`], and listed through the [`query`] module.

pub mod cache;
pub mod commands;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod query;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The updates site rooted at a base directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the update files
    pub content_dir: PathBuf,
}

impl Site {
    /// Open a site, reading `_config.yml` from `base_dir` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Open a site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);

        Self {
            config,
            base_dir,
            content_dir,
        }
    }

    /// Build a fresh index of the content directory
    pub fn index(&self) -> content::ContentIndex {
        content::ContentIndex::load(&self.content_dir)
    }

    /// Every update's metadata, newest first
    pub fn posts(&self) -> Vec<content::PostMeta> {
        let mut posts = self.index().load_all();
        query::sort_posts(&mut posts);
        posts
    }

    /// Look up an update by slug and render it
    pub fn post(&self, slug: &str) -> Option<content::Post> {
        let renderer = content::MarkdownRenderer::with_theme(&self.config.highlight_theme);
        self.index().get_by_slug(slug, &renderer)
    }
}
