//! Create a new post

use anyhow::{bail, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::Blog;

#[derive(Serialize)]
struct NewPostFrontMatter<'a> {
    title: &'a str,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    tags: &'a [String],
    description: &'a str,
}

/// Create `<content_dir>/<year>/<month>/<slug>.md` dated now
pub fn create_post(
    blog: &Blog,
    title: &str,
    category: Option<&str>,
    tags: &[String],
) -> Result<PathBuf> {
    let now = chrono::Local::now();

    let slug = slug::slugify(title);
    if slug.is_empty() {
        bail!("Cannot derive a file name from title {:?}", title);
    }

    let target_dir = blog
        .content_dir
        .join(now.format("%Y").to_string())
        .join(now.format("%m").to_string());
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let front_matter = serde_yaml::to_string(&NewPostFrontMatter {
        title,
        date: now.format("%Y-%m-%d").to_string(),
        category,
        tags,
        description: "",
    })?;
    let content = format!("---\n{}---\n\n", front_matter);

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
