//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;
use crate::content::walker::is_plain_segment;
use crate::content::Post;

/// Characters left as-is when encoding a single path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/blog/") // -> "/site/blog/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Encode one path segment (category or tag names may contain anything)
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Whether a category or tag name can be written as one listing directory.
///
/// Names with a separator or a bare `.`/`..` get no page and no link.
pub fn has_listing_page(name: &str) -> bool {
    is_plain_segment(name)
}

fn listing_path(kind: &str, name: &str) -> Option<String> {
    has_listing_page(name).then(|| format!("{}/{}/", kind, encode_segment(name)))
}

/// Site-relative path of a category listing, e.g. `category/Tech/`
pub fn category_path(category: &str) -> Option<String> {
    listing_path("category", category)
}

/// Site-relative path of a tag listing, e.g. `tag/rust/`
pub fn tag_path(tag: &str) -> Option<String> {
    listing_path("tag", tag)
}

/// Site-relative path of a post, e.g. `blog/2024/03/hello/`
pub fn post_path(post: &Post) -> String {
    format!(
        "blog/{}/{}/{}/",
        encode_segment(&post.year),
        encode_segment(&post.month),
        encode_segment(&post.slug)
    )
}

pub fn post_url(config: &SiteConfig, post: &Post) -> String {
    url_for(config, &post_path(post))
}

pub fn category_url(config: &SiteConfig, category: &str) -> Option<String> {
    category_path(category).map(|path| url_for(config, &path))
}

pub fn tag_url(config: &SiteConfig, tag: &str) -> Option<String> {
    tag_path(tag).map(|path| url_for(config, &path))
}
