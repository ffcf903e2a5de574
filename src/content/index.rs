//! Content index - derived views over every post under a content root
//!
//! `ContentIndex` re-walks and re-parses the tree on every query, so edits
//! are visible immediately and there is no cache to invalidate. Callers that
//! need several views of one consistent snapshot (a full site build, a single
//! request) call [`ContentIndex::load`] once and query the returned
//! [`PostSet`].

use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::walker::{is_plain_segment, markdown_files};
use super::{ContentError, Post};

/// Extensions tried, in order, when resolving a post by its identity
const POST_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Query interface over `<root>/<year>/<month>/<slug>.md`
#[derive(Debug, Clone)]
pub struct ContentIndex {
    root: PathBuf,
}

impl ContentIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk and parse the whole tree into a date-sorted snapshot
    pub fn load(&self) -> PostSet {
        let mut posts = Vec::new();

        for path in markdown_files(&self.root) {
            let Some((year, month, slug)) = self.identity(&path) else {
                tracing::debug!("Skipping {:?}: not at <year>/<month>/<slug>", path);
                continue;
            };
            match read_post(year, month, slug, &path) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!("Failed to load post: {}", e),
            }
        }

        tracing::debug!("Loaded {} posts from {:?}", posts.len(), self.root);
        PostSet::new(posts)
    }

    /// Every post, most recent first
    pub fn all_posts(&self) -> Vec<Post> {
        self.load().into_posts()
    }

    /// Look up a post by the path segments that identify it.
    ///
    /// This checks the file system directly rather than the walked set, so
    /// the front-matter date never affects whether a post is found. Segments
    /// that are not a single plain path component resolve to `None`.
    pub fn post(&self, year: &str, month: &str, slug: &str) -> Result<Option<Post>, ContentError> {
        if ![year, month, slug].iter().all(|s| is_plain_segment(s)) {
            return Ok(None);
        }

        let dir = self.root.join(year).join(month);
        for ext in POST_EXTENSIONS {
            let path = dir.join(format!("{}.{}", slug, ext));
            if path.is_file() {
                return read_post(year, month, slug, &path).map(Some);
            }
        }

        Ok(None)
    }

    /// Distinct categories, ascending
    pub fn categories(&self) -> Vec<String> {
        self.load().categories()
    }

    /// Distinct tags across all posts, ascending
    pub fn tags(&self) -> Vec<String> {
        self.load().tags()
    }

    pub fn posts_by_category(&self, category: &str) -> Vec<Post> {
        self.load().by_category(category)
    }

    pub fn posts_by_tag(&self, tag: &str) -> Vec<Post> {
        self.load().by_tag(tag)
    }

    /// Posts keyed by `"<year>-<month>"`, in order of first appearance
    pub fn posts_by_month(&self) -> IndexMap<String, Vec<Post>> {
        self.load().by_month()
    }

    /// Split a walked path into (year, month, slug) relative to the root
    fn identity<'p>(&self, path: &'p Path) -> Option<(&'p str, &'p str, &'p str)> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut parts = relative.components().map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        });

        let year = parts.next()??;
        let month = parts.next()??;
        parts.next()??;
        if parts.next().is_some() {
            return None;
        }
        let slug = path.file_stem()?.to_str()?;

        Some((year, month, slug))
    }
}

/// Invalid UTF-8 is replaced rather than rejected
fn read_post(year: &str, month: &str, slug: &str, path: &Path) -> Result<Post, ContentError> {
    let bytes = fs::read(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(Post::from_source(year, month, slug, &text, path.to_path_buf()))
}

/// A loaded collection of posts sorted by date, most recent first.
///
/// Posts whose date is missing or unparseable sort after all dated posts;
/// the sort is stable so equal dates keep walk order.
#[derive(Debug, Clone, Default)]
pub struct PostSet {
    posts: Vec<Post>,
}

impl PostSet {
    pub fn new(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.published().cmp(&a.published()));
        Self { posts }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn categories(&self) -> Vec<String> {
        self.posts
            .iter()
            .map(|p| p.meta.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn tags(&self) -> Vec<String> {
        self.posts
            .iter()
            .flat_map(|p| p.meta.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.meta.category == category)
            .cloned()
            .collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<Post> {
        self.posts.iter().filter(|p| p.has_tag(tag)).cloned().collect()
    }

    /// Group by `"<year>-<month>"`; groups are not sorted, posts within a
    /// group keep the date order
    pub fn by_month(&self) -> IndexMap<String, Vec<Post>> {
        let mut grouped: IndexMap<String, Vec<Post>> = IndexMap::new();
        for post in &self.posts {
            grouped.entry(post.month_key()).or_default().push(post.clone());
        }
        grouped
    }

    /// Month groups with the most recent key first, as the archive lists them
    pub fn months(&self) -> Vec<(String, Vec<Post>)> {
        let mut months: Vec<_> = self.by_month().into_iter().collect();
        months.sort_by(|a, b| b.0.cmp(&a.0));
        months
    }

    pub fn find(&self, year: &str, month: &str, slug: &str) -> Option<&Post> {
        self.posts
            .iter()
            .find(|p| p.year == year && p.month == month && p.slug == slug)
    }
}
