//! Content module - discovers, parses and converts blog posts

mod error;
mod frontmatter;
mod index;
mod markdown;
mod post;
pub mod walker;

pub use error::ContentError;
pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterValue};
pub use index::{ContentIndex, PostSet};
pub use markdown::MarkdownRenderer;
pub use post::{Post, PostMetadata, DEFAULT_CATEGORY, DEFAULT_TITLE};
