//! Generator module - writes every page of the site as static HTML

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::PostSet;
use crate::helpers;
use crate::views::SiteViews;
use crate::Blog;

/// Counts reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub categories: usize,
    pub tags: usize,
    pub pages: usize,
}

/// Static site generator
pub struct Generator {
    public_dir: PathBuf,
    views: SiteViews,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            public_dir: blog.public_dir.clone(),
            views: blog.views()?,
        })
    }

    /// Generate the entire site from one snapshot of the content tree
    pub async fn generate(&self, posts: &PostSet) -> Result<GenerateStats> {
        fs::create_dir_all(&self.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let mut stats = GenerateStats::default();

        self.write_page(&[], &self.views.home(posts)?)?;
        self.write_page(&["blog"], &self.views.blog(posts)?)?;
        self.write_page(&["about"], &self.views.about().await?)?;
        fs::write(self.public_dir.join("404.html"), self.views.not_found()?)?;
        stats.pages += 4;

        // Posts convert one at a time
        for post in posts.posts() {
            let segments = [
                "blog",
                post.year.as_str(),
                post.month.as_str(),
                post.slug.as_str(),
            ];
            let html = self.views.post(post).await?;
            self.write_page(&segments, &html)?;
            stats.posts += 1;
        }

        for category in posts.categories() {
            if let Some(html) = self.views.category(posts, &category)? {
                if self.write_listing("category", &category, &html)? {
                    stats.categories += 1;
                }
            }
        }

        for tag in posts.tags() {
            if let Some(html) = self.views.tag(posts, &tag)? {
                if self.write_listing("tag", &tag, &html)? {
                    stats.tags += 1;
                }
            }
        }

        stats.pages += stats.posts + stats.categories + stats.tags;
        Ok(stats)
    }

    /// Names that cannot be a directory are skipped with a warning
    fn write_listing(&self, kind: &str, name: &str, html: &str) -> Result<bool> {
        if !helpers::has_listing_page(name) {
            tracing::warn!("Skipping {} page for {:?}: not usable as a path", kind, name);
            return Ok(false);
        }
        self.write_page(&[kind, name], html)?;
        Ok(true)
    }

    /// Write `<public>/<segments...>/index.html`
    fn write_page(&self, segments: &[&str], html: &str) -> Result<()> {
        let dir = segments
            .iter()
            .fold(self.public_dir.clone(), |dir, segment| dir.join(segment));
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let path = dir.join("index.html");
        fs::write(&path, html).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Generated: {:?}", relative(&path, &self.public_dir));
        Ok(())
    }
}

fn relative<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}
