//! List site content

use anyhow::{bail, Result};
use serde_json::json;

use crate::content::PostSet;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str, as_json: bool) -> Result<()> {
    let posts = blog.index().load();
    let output = render(&posts, content_type, as_json)?;
    print!("{}", output);
    Ok(())
}

fn render(posts: &PostSet, content_type: &str, as_json: bool) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            if as_json {
                out = serde_json::to_string_pretty(posts.posts())?;
            } else {
                out.push_str(&format!("Posts ({}):\n", posts.len()));
                for post in posts.posts() {
                    let date = if post.meta.date.is_empty() {
                        "----------"
                    } else {
                        post.meta.date.as_str()
                    };
                    out.push_str(&format!(
                        "  {} - {} [{}/{}/{}]\n",
                        date, post.meta.title, post.year, post.month, post.slug
                    ));
                }
            }
        }
        "category" | "categories" => {
            let counts: Vec<_> = posts
                .categories()
                .into_iter()
                .map(|c| {
                    let n = posts.by_category(&c).len();
                    (c, n)
                })
                .collect();
            out = format_counts("Categories", &counts, as_json)?;
        }
        "tag" | "tags" => {
            let counts: Vec<_> = posts
                .tags()
                .into_iter()
                .map(|t| {
                    let n = posts.by_tag(&t).len();
                    (t, n)
                })
                .collect();
            out = format_counts("Tags", &counts, as_json)?;
        }
        "month" | "months" => {
            let counts: Vec<_> = posts
                .months()
                .into_iter()
                .map(|(key, group)| (key, group.len()))
                .collect();
            out = format_counts("Months", &counts, as_json)?;
        }
        other => bail!(
            "Unknown type: {}. Available types: post, category, tag, month",
            other
        ),
    }

    if as_json {
        out.push('\n');
    }
    Ok(out)
}

fn format_counts(label: &str, counts: &[(String, usize)], as_json: bool) -> Result<String> {
    if as_json {
        let items: Vec<_> = counts
            .iter()
            .map(|(name, count)| json!({ "name": name, "count": count }))
            .collect();
        return Ok(serde_json::to_string_pretty(&items)?);
    }

    let mut out = format!("{} ({}):\n", label, counts.len());
    for (name, count) in counts {
        out.push_str(&format!("  {} ({})\n", name, count));
    }
    Ok(out)
}
