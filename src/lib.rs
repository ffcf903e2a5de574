//! blogsmith: a static blog generator for markdown posts
//!
//! Posts live at `<content_dir>/<year>/<month>/<slug>.md`, start with a YAML
//! front-matter block, and are converted to sanitized HTML with syntax
//! highlighted code. The site can be written out as static files or served
//! directly from the content tree.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;
pub mod views;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content root holding `<year>/<month>/<slug>.md`
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Shared markdown converter (syntax and theme sets load once)
    pub renderer: Arc<content::MarkdownRenderer>,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = config::SiteConfig::load_or_default(&base_dir)?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let renderer = Arc::new(content::MarkdownRenderer::with_options(&config.highlight));

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            renderer,
        }
    }

    /// Query interface over the content root
    pub fn index(&self) -> content::ContentIndex {
        content::ContentIndex::new(&self.content_dir)
    }

    /// Convert a markdown body to sanitized HTML
    pub async fn markdown_to_html(&self, markdown: &str) -> Result<String> {
        Ok(self
            .renderer
            .clone()
            .render_async(markdown.to_string())
            .await?)
    }

    /// Page builders bound to this blog's configuration
    pub fn views(&self) -> Result<views::SiteViews> {
        views::SiteViews::new(self.config.clone(), self.renderer.clone())
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, category: Option<&str>, tags: &[String]) -> Result<PathBuf> {
        commands::new::create_post(self, title, category, tags)
    }
}
