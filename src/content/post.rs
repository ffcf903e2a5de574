//! Post model

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

use super::frontmatter::{parse_date_string, FrontMatter};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Metadata read from a post's front-matter, with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostMetadata {
    pub title: String,

    /// Date as written by the author; empty when absent
    pub date: String,

    pub category: String,

    /// Distinct tags in the order they were written
    pub tags: Vec<String>,

    pub description: String,
}

impl Default for PostMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            date: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
            description: String::new(),
        }
    }
}

impl PostMetadata {
    /// Coerce front-matter fields, substituting the default for each missing one
    pub fn from_front_matter(fm: &FrontMatter) -> Self {
        let defaults = Self::default();

        let mut tags: Vec<String> = Vec::new();
        for tag in fm.list("tags") {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Self {
            title: fm.text("title").map_or(defaults.title, str::to_string),
            date: fm.text("date").map_or(defaults.date, str::to_string),
            category: fm.text("category").map_or(defaults.category, str::to_string),
            tags,
            description: fm
                .text("description")
                .map_or(defaults.description, str::to_string),
        }
    }
}

/// A blog post located at `<root>/<year>/<month>/<slug>.md`
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMetadata,

    /// File name without extension
    pub slug: String,

    /// First directory segment below the content root
    pub year: String,

    /// Second directory segment below the content root
    pub month: String,

    /// Raw markdown body (not yet converted)
    pub content: String,

    /// Full source file path
    #[serde(skip)]
    pub source: PathBuf,

    /// Parsed `meta.date`, used for ordering
    #[serde(skip)]
    published: Option<NaiveDateTime>,
}

impl Post {
    /// Build a post from the raw file text and its path-derived identity
    pub fn from_source(
        year: impl Into<String>,
        month: impl Into<String>,
        slug: impl Into<String>,
        text: &str,
        source: PathBuf,
    ) -> Self {
        let (fm, body) = FrontMatter::parse(text);
        let meta = PostMetadata::from_front_matter(&fm);
        let published = parse_date_string(&meta.date);
        if published.is_none() && !meta.date.is_empty() {
            tracing::warn!("Unparseable date {:?} in {:?}", meta.date, source);
        }

        Self {
            meta,
            slug: slug.into(),
            year: year.into(),
            month: month.into(),
            content: body.to_string(),
            source,
            published,
        }
    }

    /// Parsed publication date; `None` sorts after every dated post
    pub fn published(&self) -> Option<NaiveDateTime> {
        self.published
    }

    /// Grouping key used by the month archive
    pub fn month_key(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.meta.tags.iter().any(|t| t == tag)
    }
}
